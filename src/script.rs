use std::time::Duration;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::core::{DEFAULT_POSITION, Point, Rgba8};

/// What a step does to the scene. The set is open: upstream generators are
/// free to emit verbs this engine does not know, and those must replay as
/// no-ops rather than abort playback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    Transform,
    Connect,
    Highlight,
    Unknown(String),
}

impl Action {
    pub fn parse(s: &str) -> Self {
        match s {
            "create" => Self::Create,
            "transform" => Self::Transform,
            "connect" => Self::Connect,
            "highlight" => Self::Highlight,
            _ => Self::Unknown(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "create",
            Self::Transform => "transform",
            Self::Connect => "connect",
            Self::Highlight => "highlight",
            Self::Unknown(s) => s,
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Non-string action values degrade to the unknown no-op like any
        // other unrecognized verb.
        let v = serde_json::Value::deserialize(deserializer)?;
        Ok(match v {
            serde_json::Value::String(s) => Self::parse(&s),
            _ => Self::default(),
        })
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Circle,
    Square,
    Triangle,
}

impl Shape {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "circle" => Some(Self::Circle),
            "square" => Some(Self::Square),
            "triangle" => Some(Self::Triangle),
            _ => None,
        }
    }
}

/// Partial style record carried by `create` and `transform` steps. Absent
/// keys leave the element untouched on merge; present-but-unparseable values
/// resolve to the defaults instead of failing the script.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepProps {
    #[serde(
        default,
        deserialize_with = "de_lenient_shape",
        skip_serializing_if = "Option::is_none"
    )]
    pub shape: Option<Shape>,

    #[serde(
        default,
        deserialize_with = "de_lenient_color",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<Rgba8>,
}

/// One unit of an animation script.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationStep {
    #[serde(default)]
    pub action: Action,

    /// Target element for `create`/`transform`/`highlight`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    /// Connection endpoints for `connect`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Wire format is a `[x, y]` pair; anything malformed or non-finite
    /// deserializes to `None` and falls back to [`DEFAULT_POSITION`].
    #[serde(
        default,
        deserialize_with = "de_lenient_position",
        serialize_with = "ser_position",
        skip_serializing_if = "Option::is_none"
    )]
    pub position: Option<Point>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<StepProps>,

    /// Caption shown while this step is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Seconds this step remains active before the next one runs.
    #[serde(
        default,
        deserialize_with = "de_lenient_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<f64>,
}

impl AnimationStep {
    pub const DEFAULT_DWELL_SECS: f64 = 2.0;

    pub fn create(element: impl Into<String>) -> Self {
        Self {
            action: Action::Create,
            element: Some(element.into()),
            ..Self::default()
        }
    }

    pub fn transform(element: impl Into<String>) -> Self {
        Self {
            action: Action::Transform,
            element: Some(element.into()),
            ..Self::default()
        }
    }

    pub fn connect(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            action: Action::Connect,
            from: Some(from.into()),
            to: Some(to.into()),
            ..Self::default()
        }
    }

    pub fn highlight(element: impl Into<String>) -> Self {
        Self {
            action: Action::Highlight,
            element: Some(element.into()),
            ..Self::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.properties.get_or_insert_with(StepProps::default).shape = Some(shape);
        self
    }

    pub fn color(mut self, color: Rgba8) -> Self {
        self.properties.get_or_insert_with(StepProps::default).color = Some(color);
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn secs(mut self, secs: f64) -> Self {
        self.duration = Some(secs);
        self
    }

    /// Wall-clock time this step stays active. Non-positive and non-finite
    /// durations fall back to the 2-second default.
    pub fn dwell(&self) -> Duration {
        let secs = match self.duration {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => Self::DEFAULT_DWELL_SECS,
        };
        Duration::from_secs_f64(secs)
    }

    /// Caption for this step at `index`, falling back to `"Step {n}"`.
    pub fn caption(&self, index: usize) -> String {
        match &self.description {
            Some(d) if !d.is_empty() => d.clone(),
            _ => format!("Step {}", index + 1),
        }
    }

    /// The position this step places its element at.
    pub fn position_or_default(&self) -> Point {
        self.position.unwrap_or(DEFAULT_POSITION)
    }
}

/// The document an upstream explanation generator emits: a step list plus
/// descriptive context. Unknown fields are ignored.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ScriptDoc {
    #[serde(default = "default_animation_type", alias = "animationType")]
    pub animation_type: String,

    #[serde(default, alias = "conceptDefinition")]
    pub concept_definition: String,

    #[serde(default, alias = "stepwiseLogic")]
    pub stepwise_logic: String,

    #[serde(default, alias = "animationSteps")]
    pub steps: Vec<AnimationStep>,
}

fn default_animation_type() -> String {
    "algorithm".to_string()
}

impl ScriptDoc {
    pub fn from_json_str(s: &str) -> crate::error::ChalklineResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| crate::error::ChalklineError::script(format!("parse script JSON: {e}")))
    }

    /// The step list to play: the document's own steps, or the documented
    /// one-step fallback when the generator produced none.
    pub fn steps_or_fallback(&self) -> Vec<AnimationStep> {
        if self.steps.is_empty() {
            let caption = if self.concept_definition.is_empty() {
                None
            } else {
                Some(self.concept_definition.as_str())
            };
            fallback_steps(caption)
        } else {
            self.steps.clone()
        }
    }
}

/// Minimal script substituted when no steps were supplied: a single default
/// labeled circle, so playback always has at least one step to run.
pub fn fallback_steps(caption: Option<&str>) -> Vec<AnimationStep> {
    vec![
        AnimationStep::create("concept")
            .at(DEFAULT_POSITION.x, DEFAULT_POSITION.y)
            .shape(Shape::Circle)
            .color(Rgba8::default_fill())
            .describe(caption.unwrap_or("Concept Visualization"))
            .secs(3.0),
    ]
}

fn de_lenient_shape<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Shape>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(Shape::parse(&s).unwrap_or_default()),
        _ => Some(Shape::default()),
    })
}

fn de_lenient_color<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Rgba8>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => {
            Some(Rgba8::parse_hex(&s).unwrap_or(Rgba8::default_fill()))
        }
        _ => Some(Rgba8::default_fill()),
    })
}

fn de_lenient_position<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Point>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    let serde_json::Value::Array(items) = v else {
        return Ok(None);
    };
    let (Some(x), Some(y)) = (
        items.first().and_then(serde_json::Value::as_f64),
        items.get(1).and_then(serde_json::Value::as_f64),
    ) else {
        return Ok(None);
    };
    if !(x.is_finite() && y.is_finite()) {
        return Ok(None);
    }
    Ok(Some(Point::new(x, y)))
}

fn de_lenient_duration<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(v.as_f64().filter(|d| d.is_finite() && *d > 0.0))
}

fn ser_position<S: Serializer>(p: &Option<Point>, serializer: S) -> Result<S::Ok, S::Error> {
    match p {
        Some(p) => {
            let mut seq = serializer.serialize_seq(Some(2))?;
            seq.serialize_element(&p.x)?;
            seq.serialize_element(&p.y)?;
            seq.end()
        }
        None => serializer.serialize_none(),
    }
}
