use std::collections::BTreeMap;

use crate::core::{Point, Rgba8};
use crate::script::Shape;

/// Resolved (non-partial) visual style of a scene element.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementStyle {
    pub shape: Shape,
    pub color: Rgba8,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            shape: Shape::Circle,
            color: Rgba8::default_fill(),
        }
    }
}

/// One labeled shape on the surface.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneElement {
    /// Display identifier; equal to the element's key in the model.
    pub name: String,
    pub position: Point,
    pub style: ElementStyle,
    /// Outgoing connection targets, in append order. Duplicates are kept;
    /// targets that never materialize are skipped at draw time.
    pub connections: Vec<String>,
}

impl SceneElement {
    pub fn new(name: impl Into<String>, position: Point, style: ElementStyle) -> Self {
        Self {
            name: name.into(),
            position,
            style,
            connections: Vec::new(),
        }
    }
}

/// The authoritative current visual state: element id -> element. Keys are
/// unique; iteration order is the stable key order, which rendering may use
/// for determinism but never for visual correctness.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneModel {
    elements: BTreeMap<String, SceneElement>,
}

impl SceneModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&SceneElement> {
        self.elements.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SceneElement)> {
        self.elements.iter()
    }

    pub(crate) fn insert(&mut self, id: String, element: SceneElement) {
        self.elements.insert(id, element);
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut SceneElement> {
        self.elements.get_mut(id)
    }
}
