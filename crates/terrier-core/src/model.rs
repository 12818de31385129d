//! Input primitives and shared vocabulary types.
//!
//! `VectorPrimitive` and `TextToken` are produced by the ingestion
//! collaborator and consumed read-only; everything downstream of the scale
//! stage works in world feet.

use crate::depth::DepthSummary;
use crate::geom::{Point, Rect};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Line,
    Polyline,
    Rect,
    Circle,
    Arc,
}

/// One stroked shape lifted from a drawing page, in drawing units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPrimitive {
    pub kind: PrimitiveKind,
    pub points: Vec<Point>,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub layer: Option<String>,
}

impl VectorPrimitive {
    pub fn new(kind: PrimitiveKind, points: Vec<Point>) -> Self {
        Self {
            kind,
            points,
            stroke_color: String::new(),
            stroke_width: 1.0,
            layer: None,
        }
    }

    pub fn with_stroke(mut self, color: impl Into<String>, width: f64) -> Self {
        self.stroke_color = color.into();
        self.stroke_width = width;
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// Primitive rewritten through a point mapping (drawing units -> feet).
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            points: self.points.iter().map(|p| f(*p)).collect(),
            ..self.clone()
        }
    }
}

/// One text run lifted from a drawing page, bbox in drawing units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToken {
    pub content: String,
    pub bbox: Rect,
    pub layer: Option<String>,
}

impl TextToken {
    pub fn new(content: impl Into<String>, bbox: Rect) -> Self {
        Self {
            content: content.into(),
            bbox,
            layer: None,
        }
    }

    pub fn center(&self) -> Point {
        self.bbox.center()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    Storm,
    Sanitary,
    Water,
}

impl Discipline {
    /// Fixed processing order; parallel runs merge results in this order so
    /// output is deterministic.
    pub const ALL: [Discipline; 3] = [Discipline::Storm, Discipline::Sanitary, Discipline::Water];

    pub fn as_str(self) -> &'static str {
        match self {
            Discipline::Storm => "storm",
            Discipline::Sanitary => "sanitary",
            Discipline::Water => "water",
        }
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed attribute value for node/edge extension maps.
///
/// The drawings domain needs free-form per-element attributes (valve
/// subtypes, rim elevations, depth summaries) without collapsing to an
/// untyped JSON bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Depth(DepthSummary),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_depth(&self) -> Option<&DepthSummary> {
        match self {
            AttrValue::Depth(d) => Some(d),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Flag(b)
    }
}

/// Insertion-ordered so serialized output is stable across runs.
pub type AttrMap = IndexMap<String, AttrValue>;
