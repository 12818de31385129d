//! Rule-based quality validation over the enriched graph.
//!
//! Stateless and order-insensitive: every check runs independently and the
//! result is the plain concatenation of whatever fired. Overlapping
//! heuristics may flag the same defect twice; the QA reviewer sees both, by
//! contract. Violations are data for a human, not errors.

use crate::config::{DepthConfig, QaConfig};
use crate::geom::Point;
use crate::model::{PrimitiveKind, VectorPrimitive};
use crate::network::{Edge, Network};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QAViolation {
    /// Stable rule identifier, e.g. `"slope-below-min"`.
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    /// World-feet position of the offending element, when it has one.
    pub location: Option<Point>,
    /// Id of the edge or node the rule fired on.
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl QAViolation {
    fn new(rule: &str, severity: Severity, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            message,
            location: None,
            subject: None,
            details: BTreeMap::new(),
        }
    }

    fn at_edge(mut self, edge: &Edge) -> Self {
        self.subject = Some(edge.id.clone());
        self.location = Some(edge.points[edge.points.len() / 2]);
        self
    }

    fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Per-edge checks for one discipline's network: slope envelope, cover,
/// and the shoring trigger.
pub fn validate_network(
    net: &Network,
    cfg: &QaConfig,
    depth_cfg: &DepthConfig,
) -> Vec<QAViolation> {
    let mut out = Vec::new();
    let slope_range = cfg.slope_range_pct(net.discipline);
    let min_cover = depth_cfg.min_cover_ft(net.discipline);

    for edge in &net.edges {
        if let (Some((min, max)), Some(slope)) = (slope_range, edge.slope_pct) {
            if slope < min {
                out.push(
                    QAViolation::new(
                        "slope-below-min",
                        Severity::Error,
                        format!(
                            "{} slope {slope:.2}% is below the {} minimum of {min:.2}%",
                            edge.id, net.discipline
                        ),
                    )
                    .at_edge(edge)
                    .detail("slope_pct", slope)
                    .detail("min_pct", min),
                );
            } else if slope > max {
                out.push(
                    QAViolation::new(
                        "slope-above-max",
                        Severity::Warning,
                        format!(
                            "{} slope {slope:.2}% exceeds the {} maximum of {max:.2}%",
                            edge.id, net.discipline
                        ),
                    )
                    .at_edge(edge)
                    .detail("slope_pct", slope)
                    .detail("max_pct", max),
                );
            }
        }

        let Some(summary) = edge.depth_summary() else {
            continue;
        };
        // A zero-sample summary means no invert data; missing data is not a
        // depth violation.
        if summary.samples == 0 {
            continue;
        }
        // The analyzer already judged cover against the same minimum, with
        // boundary ties going to compliant; re-deriving it here from the
        // rounded summary would re-open them.
        if !summary.cover_ok {
            out.push(
                QAViolation::new(
                    "cover-low",
                    Severity::Error,
                    format!(
                        "{} cover {:.2} ft is below the {} minimum of {min_cover:.2} ft",
                        edge.id, summary.min_cover_ft, net.discipline
                    ),
                )
                .at_edge(edge)
                .detail("min_cover_ft", summary.min_cover_ft)
                .detail("required_ft", min_cover),
            );
        }
        if summary.deep_excavation {
            out.push(
                QAViolation::new(
                    "deep-excavation",
                    Severity::Error,
                    format!(
                        "{} reaches {:.2} ft, past the {:.1} ft OSHA protective-system trigger",
                        edge.id, summary.max_depth_ft, depth_cfg.osha_trigger_depth_ft
                    ),
                )
                .at_edge(edge)
                .detail("max_depth_ft", summary.max_depth_ft)
                .detail("trigger_ft", depth_cfg.osha_trigger_depth_ft),
            );
        }
    }
    out
}

/// ADA geometry checks over raw page linework, independent of the pipe
/// networks. A two-point stroke whose grade sits in the plausible ramp band
/// (0-20%) is read as a ramp; its drawn stroke width stands in for the ramp
/// width, which is all plan linework gives us. Point geometry arrives in
/// world feet but stroke widths stay in drawing units, so the page's
/// `feet_per_unit` converts them before the width threshold applies.
pub fn check_ada(
    primitives: &[VectorPrimitive],
    feet_per_unit: f64,
    cfg: &QaConfig,
) -> Vec<QAViolation> {
    let mut out = Vec::new();
    for prim in primitives {
        if prim.kind != PrimitiveKind::Line {
            continue;
        }
        let [a, b] = prim.points[..] else { continue };
        let run = (b.x - a.x).abs();
        if run <= f64::EPSILON {
            continue;
        }
        let slope_pct = (b.y - a.y).abs() / run * 100.0;
        if slope_pct <= 0.0 || slope_pct > 20.0 {
            continue;
        }
        let mid = crate::geom::point((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        if slope_pct > cfg.ada_max_ramp_slope_pct {
            let mut v = QAViolation::new(
                "ada-ramp-slope",
                Severity::Error,
                format!(
                    "ramp slope {slope_pct:.2}% exceeds the ADA maximum of {:.2}%",
                    cfg.ada_max_ramp_slope_pct
                ),
            )
            .detail("slope_pct", slope_pct)
            .detail("max_pct", cfg.ada_max_ramp_slope_pct);
            v.location = Some(mid);
            out.push(v);
        }
        let width_ft = prim.stroke_width * feet_per_unit;
        if width_ft < cfg.ada_min_ramp_width_ft {
            let mut v = QAViolation::new(
                "ada-ramp-width",
                Severity::Error,
                format!(
                    "ramp width {width_ft:.2} ft is below the ADA minimum of {:.2} ft",
                    cfg.ada_min_ramp_width_ft
                ),
            )
            .detail("width_ft", width_ft)
            .detail("min_ft", cfg.ada_min_ramp_width_ft);
            v.location = Some(mid);
            out.push(v);
        }
    }
    out
}

/// Externally measured earthwork totals, cubic yards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarthworkTotals {
    pub cut_cu_yd: f64,
    pub fill_cu_yd: f64,
}

/// Compares measured cut/fill against the totals parsed from the drawing's
/// earthwork schedule. Disagreement beyond the tolerance is a warning
/// carrying both values.
pub fn check_schedule(
    measured: &EarthworkTotals,
    table: &EarthworkTotals,
    cfg: &QaConfig,
) -> Vec<QAViolation> {
    let mut out = Vec::new();
    for (what, m, t) in [
        ("cut", measured.cut_cu_yd, table.cut_cu_yd),
        ("fill", measured.fill_cu_yd, table.fill_cu_yd),
    ] {
        let denom = t.abs().max(1e-9);
        let rel = (m - t).abs() / denom;
        if rel > cfg.schedule_tolerance {
            out.push(
                QAViolation::new(
                    "schedule-mismatch",
                    Severity::Warning,
                    format!(
                        "measured {what} {m:.0} CY disagrees with schedule {t:.0} CY by {:.1}%",
                        rel * 100.0
                    ),
                )
                .detail("measured_cu_yd", m)
                .detail("table_cu_yd", t)
                .detail("relative_diff", rel),
            );
        }
    }
    out
}
