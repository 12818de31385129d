#![forbid(unsafe_code)]

//! Semantic utility-network reconstruction from drawing vectors (headless).
//!
//! Given a page's vector primitives and text tokens (ingestion is the
//! caller's problem) plus a symbol catalog (classification is too), this
//! crate rebuilds storm/sanitary/water networks, attaches labeled
//! attributes, samples trench depth against an external ground model, and
//! flags rule violations for QA review.
//!
//! Design goals:
//! - deterministic outputs for a given input and catalog ordering
//! - ambiguity degrades to flagged defaults; only broken caller contracts
//!   return errors
//! - no hidden state: catalog and tolerances travel explicitly

pub mod catalog;
pub mod config;
pub mod depth;
pub mod error;
pub mod geom;
pub mod graph;
pub mod label;
pub mod model;
pub mod network;
pub mod pipeline;
pub mod qa;
pub mod scale;
pub mod symbol;

pub use catalog::{SymbolCatalog, SymbolCatalogEntry, SymbolCategory, SymbolPredicate};
pub use config::{
    DepthConfig, GraphConfig, LabelConfig, MatchConfig, PipelineConfig, QaConfig, ScaleConfig,
};
pub use depth::{DepthBuckets, DepthSample, DepthSummary};
pub use error::{Error, Result};
pub use model::{AttrMap, AttrValue, Discipline, PrimitiveKind, TextToken, VectorPrimitive};
pub use network::{Edge, Network, Node, NodeKind};
pub use pipeline::{GroundElevationFn, PageAnalysis, PageInput, Pipeline, ScheduleCheck};
pub use qa::{EarthworkTotals, QAViolation, Severity};
pub use scale::{ScaleSource, ScaleTransform};
