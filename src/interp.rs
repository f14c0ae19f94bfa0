use crate::scene::{ElementStyle, SceneElement, SceneModel};
use crate::script::{Action, AnimationStep, StepProps};

/// Fold one step into the model. Total: malformed steps, unknown actions,
/// and references to elements that do not (yet) exist leave the model in a
/// valid state instead of failing playback, so a loosely-authored script
/// degrades to a visibly incomplete animation rather than an aborted one.
pub fn apply_step(model: &mut SceneModel, step: &AnimationStep) {
    match &step.action {
        Action::Create => {
            let Some(id) = step.element.as_deref() else {
                return;
            };
            let element = SceneElement::new(
                id,
                step.position_or_default(),
                resolve_style(step.properties.as_ref()),
            );
            // Wholesale replace on an existing key; connections are not
            // carried over.
            model.insert(id.to_string(), element);
        }
        Action::Transform => {
            let Some(id) = step.element.as_deref() else {
                return;
            };
            // No implicit creation: transforming a missing element is a no-op.
            let Some(element) = model.get_mut(id) else {
                return;
            };
            if let Some(props) = &step.properties {
                if let Some(shape) = props.shape {
                    element.style.shape = shape;
                }
                if let Some(color) = props.color {
                    element.style.color = color;
                }
            }
        }
        Action::Connect => {
            let (Some(from), Some(to)) = (step.from.as_deref(), step.to.as_deref()) else {
                return;
            };
            // Both endpoints must exist; a dangling connect is dropped, not
            // queued for retry.
            if !model.contains(to) {
                return;
            }
            let Some(source) = model.get_mut(from) else {
                return;
            };
            source.connections.push(to.to_string());
        }
        Action::Highlight => {
            // Rendering hint only; the renderer reads it off the current
            // step index.
        }
        Action::Unknown(raw) => {
            tracing::debug!(action = %raw, "ignoring unknown step action");
        }
    }
}

/// Scene state after replaying steps `0..=index` over an empty model. An
/// index at or past the end replays the whole script.
pub fn model_at(steps: &[AnimationStep], index: usize) -> SceneModel {
    let mut model = SceneModel::new();
    for step in steps.iter().take(index.saturating_add(1)) {
        apply_step(&mut model, step);
    }
    model
}

fn resolve_style(props: Option<&StepProps>) -> ElementStyle {
    let defaults = ElementStyle::default();
    match props {
        Some(p) => ElementStyle {
            shape: p.shape.unwrap_or(defaults.shape),
            color: p.color.unwrap_or(defaults.color),
        },
        None => defaults,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DEFAULT_POSITION, PALETTE, Point, Rgba8};
    use crate::script::Shape;

    #[test]
    fn create_inserts_with_given_position_and_style() {
        let mut model = SceneModel::new();
        apply_step(
            &mut model,
            &AnimationStep::create("A")
                .at(100.0, 100.0)
                .shape(Shape::Square)
                .color(PALETTE[2]),
        );

        let el = model.get("A").unwrap();
        assert_eq!(el.name, "A");
        assert_eq!(el.position, Point::new(100.0, 100.0));
        assert_eq!(el.style.shape, Shape::Square);
        assert_eq!(el.style.color, PALETTE[2]);
        assert!(el.connections.is_empty());
    }

    #[test]
    fn create_without_position_uses_default_center() {
        let mut model = SceneModel::new();
        apply_step(&mut model, &AnimationStep::create("A"));
        let el = model.get("A").unwrap();
        assert_eq!(el.position, DEFAULT_POSITION);
        assert_eq!(el.style.shape, Shape::Circle);
        assert_eq!(el.style.color, Rgba8::default_fill());
    }

    #[test]
    fn create_replaces_wholesale() {
        let mut model = SceneModel::new();
        apply_step(&mut model, &AnimationStep::create("A").at(10.0, 10.0));
        apply_step(&mut model, &AnimationStep::create("B").at(20.0, 20.0));
        apply_step(&mut model, &AnimationStep::connect("A", "B"));
        assert_eq!(model.get("A").unwrap().connections, vec!["B".to_string()]);

        // Re-creating A drops its connections and style.
        apply_step(
            &mut model,
            &AnimationStep::create("A").at(30.0, 30.0).shape(Shape::Triangle),
        );
        let el = model.get("A").unwrap();
        assert!(el.connections.is_empty());
        assert_eq!(el.position, Point::new(30.0, 30.0));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn transform_merges_field_by_field() {
        let mut model = SceneModel::new();
        apply_step(
            &mut model,
            &AnimationStep::create("A").shape(Shape::Square).color(PALETTE[3]),
        );

        // Only the color key is present; shape must survive.
        apply_step(&mut model, &AnimationStep::transform("A").color(PALETTE[1]));
        let el = model.get("A").unwrap();
        assert_eq!(el.style.shape, Shape::Square);
        assert_eq!(el.style.color, PALETTE[1]);
    }

    #[test]
    fn transform_of_missing_element_is_a_noop() {
        let mut model = SceneModel::new();
        apply_step(
            &mut model,
            &AnimationStep::transform("ghost").shape(Shape::Triangle),
        );
        assert!(model.is_empty());
    }

    #[test]
    fn connect_appends_and_allows_duplicates() {
        let mut model = SceneModel::new();
        apply_step(&mut model, &AnimationStep::create("A"));
        apply_step(&mut model, &AnimationStep::create("B"));
        apply_step(&mut model, &AnimationStep::connect("A", "B"));
        apply_step(&mut model, &AnimationStep::connect("A", "B"));
        assert_eq!(
            model.get("A").unwrap().connections,
            vec!["B".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn connect_with_missing_endpoint_is_a_noop() {
        let mut model = SceneModel::new();
        apply_step(&mut model, &AnimationStep::create("A"));
        apply_step(&mut model, &AnimationStep::connect("A", "missing"));
        apply_step(&mut model, &AnimationStep::connect("missing", "A"));
        assert!(model.get("A").unwrap().connections.is_empty());
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn self_connect_is_kept() {
        let mut model = SceneModel::new();
        apply_step(&mut model, &AnimationStep::create("A"));
        apply_step(&mut model, &AnimationStep::connect("A", "A"));
        assert_eq!(model.get("A").unwrap().connections, vec!["A".to_string()]);
    }

    #[test]
    fn highlight_and_unknown_leave_model_untouched() {
        let mut model = SceneModel::new();
        apply_step(&mut model, &AnimationStep::create("A"));
        let before = model.clone();

        apply_step(&mut model, &AnimationStep::highlight("A"));
        let mut odd = AnimationStep::create("B");
        odd.action = Action::Unknown("sparkle".to_string());
        apply_step(&mut model, &odd);

        assert_eq!(model, before);
    }

    #[test]
    fn steps_missing_identifiers_are_noops() {
        let mut model = SceneModel::new();
        apply_step(
            &mut model,
            &AnimationStep {
                action: Action::Create,
                ..AnimationStep::default()
            },
        );
        apply_step(
            &mut model,
            &AnimationStep {
                action: Action::Connect,
                from: Some("A".to_string()),
                ..AnimationStep::default()
            },
        );
        assert!(model.is_empty());
    }

    #[test]
    fn model_at_replays_a_prefix() {
        let steps = vec![
            AnimationStep::create("A").at(100.0, 100.0),
            AnimationStep::create("B").at(200.0, 100.0),
            AnimationStep::connect("A", "B"),
        ];

        assert_eq!(model_at(&steps, 0).len(), 1);
        assert_eq!(model_at(&steps, 1).len(), 2);

        let full = model_at(&steps, 2);
        assert_eq!(full.get("A").unwrap().connections, vec!["B".to_string()]);

        // Past-the-end replays everything.
        assert_eq!(model_at(&steps, 99), full);
    }
}
