pub type ChalklineResult<T> = Result<T, ChalklineError>;

#[derive(thiserror::Error, Debug)]
pub enum ChalklineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChalklineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ChalklineError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ChalklineError::script("x")
                .to_string()
                .contains("script error:")
        );
        assert!(
            ChalklineError::playback("x")
                .to_string()
                .contains("playback error:")
        );
        assert!(
            ChalklineError::render("x")
                .to_string()
                .contains("render error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ChalklineError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
