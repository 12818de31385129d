//! Reconstructed utility graph: nodes, pipe runs, and the per-discipline
//! network that owns them.

use crate::error::{Error, Result};
use crate::geom::{self, Point};
use crate::model::{AttrMap, AttrValue, Discipline};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Manhole,
    Inlet,
    Valve,
    Hydrant,
    Meter,
    Junction,
    Unknown,
}

/// A structure or fitting at a fixed position, in world feet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "AttrMap::is_empty")]
    pub attrs: AttrMap,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind, at: Point) -> Self {
        Self {
            id: id.into(),
            kind,
            x: at.x,
            y: at.y,
            z: None,
            attrs: AttrMap::new(),
        }
    }

    pub fn position(&self) -> Point {
        geom::point(self.x, self.y)
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(key.into(), value.into());
    }
}

/// A continuous pipe run. Endpoints stay `None` when no node sat within
/// snapping tolerance; an unresolved endpoint is data, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub discipline: Discipline,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Centerline in world feet; always at least two points.
    pub points: Vec<Point>,
    pub diameter_in: Option<f64>,
    pub material: Option<String>,
    /// Percent (0.5 = 0.5%).
    pub slope_pct: Option<f64>,
    /// Schedule-stated length taking precedence over the drawn geometry.
    pub length_override_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "AttrMap::is_empty")]
    pub attrs: AttrMap,
}

impl Edge {
    pub fn new(id: impl Into<String>, discipline: Discipline, points: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            discipline,
            from: None,
            to: None,
            points,
            diameter_in: None,
            material: None,
            slope_pct: None,
            length_override_ft: None,
            attrs: AttrMap::new(),
        }
    }

    /// Run length in feet, derived from the polyline unless overridden.
    pub fn length_ft(&self) -> f64 {
        self.length_override_ft
            .unwrap_or_else(|| geom::polyline_length(&self.points))
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn depth_summary(&self) -> Option<&crate::depth::DepthSummary> {
        self.attrs.get("depth").and_then(AttrValue::as_depth)
    }
}

/// One discipline's reconstructed graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub discipline: Discipline,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Network {
    pub fn new(name: impl Into<String>, discipline: Discipline) -> Self {
        Self {
            name: name.into(),
            discipline,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Nearest node within `tolerance_ft` of `p`, ties going to the earlier
    /// node so lookups are reproducible.
    pub fn node_near(&self, p: Point, tolerance_ft: f64) -> Option<&Node> {
        let mut best: Option<(&Node, f64)> = None;
        for n in &self.nodes {
            let d = (n.position() - p).length();
            if d <= tolerance_ft && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((n, d));
            }
        }
        best.map(|(n, _)| n)
    }

    /// Checks the structural invariant: every resolved edge endpoint names a
    /// node present in this network, and every polyline has two points.
    pub fn validate(&self) -> Result<()> {
        let ids: std::collections::BTreeSet<&str> =
            self.nodes.iter().map(|n| n.id.as_str()).collect();
        for e in &self.edges {
            if e.points.len() < 2 {
                return Err(Error::DegeneratePolyline {
                    edge_id: e.id.clone(),
                    points: e.points.len(),
                });
            }
            for endpoint in [&e.from, &e.to] {
                if let Some(node_id) = endpoint {
                    if !ids.contains(node_id.as_str()) {
                        return Err(Error::MissingEndpoint {
                            network: self.name.clone(),
                            edge_id: e.id.clone(),
                            node_id: node_id.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn total_pipe_length_ft(&self) -> f64 {
        self.edges.iter().map(Edge::length_ft).sum()
    }
}
