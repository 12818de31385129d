//! Symbol catalog: the classification collaborator's output, consumed
//! read-only.
//!
//! Entry order is significant: ties during matching resolve to the
//! first-registered entry, so classification is reproducible given the same
//! catalog.

use crate::config::MatchConfig;
use crate::geom;
use crate::model::{Discipline, PrimitiveKind, VectorPrimitive};
use crate::network::NodeKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "role")]
pub enum SymbolCategory {
    /// A point structure; `discipline: None` means the symbol appears on any
    /// utility sheet (e.g. a generic manhole).
    Node {
        kind: NodeKind,
        discipline: Option<Discipline>,
    },
    /// Pipe linework for one discipline.
    Pipe { discipline: Discipline },
}

/// Shape/stroke predicate a primitive must satisfy to take an entry's
/// category. All populated fields must hold; an empty predicate matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolPredicate {
    pub shape: Option<PrimitiveKind>,
    /// Inclusive stroke-width range, drawing-stroke units.
    pub stroke_width: Option<(f64, f64)>,
    /// Whether the symbol is drawn with doubled/hatched linework, read from
    /// stroke width against [`MatchConfig::double_stroke_min_width`].
    pub double_stroke: Option<bool>,
    /// Largest bbox dimension at most this, world feet. Separates small
    /// fittings (valves, meters) from larger structures.
    pub max_extent_ft: Option<f64>,
    pub min_extent_ft: Option<f64>,
    /// Case-insensitive substring required in the primitive's layer tag.
    pub layer_hint: Option<String>,
}

impl SymbolPredicate {
    pub fn matches(&self, prim: &VectorPrimitive, cfg: &MatchConfig) -> bool {
        if let Some(shape) = self.shape {
            if prim.kind != shape {
                return false;
            }
        }
        if let Some((lo, hi)) = self.stroke_width {
            if prim.stroke_width < lo || prim.stroke_width > hi {
                return false;
            }
        }
        if let Some(double) = self.double_stroke {
            if (prim.stroke_width >= cfg.double_stroke_min_width) != double {
                return false;
            }
        }
        if self.max_extent_ft.is_some() || self.min_extent_ft.is_some() {
            let extent = geom::bounding_rect(&prim.points)
                .map(|r| r.size.width.max(r.size.height))
                .unwrap_or(0.0);
            if self.max_extent_ft.is_some_and(|max| extent > max) {
                return false;
            }
            if self.min_extent_ft.is_some_and(|min| extent < min) {
                return false;
            }
        }
        if let Some(hint) = &self.layer_hint {
            let Some(layer) = &prim.layer else {
                return false;
            };
            if !layer.to_ascii_lowercase().contains(&hint.to_ascii_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolCatalogEntry {
    /// Legend name, e.g. `"water gate valve"`. Drives the context-keyword
    /// tie-break during matching.
    pub name: String,
    pub category: SymbolCategory,
    pub predicate: SymbolPredicate,
    /// Candidate regexes for labels the legend associates with this symbol
    /// (structure tags like `MH-\d+`). Advisory; applied by label attachment.
    pub label_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolCatalog {
    entries: Vec<SymbolCatalogEntry>,
}

impl SymbolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: SymbolCatalogEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[SymbolCatalogEntry] {
        &self.entries
    }

    pub fn entry_by_name(&self, name: &str) -> Option<&SymbolCatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
