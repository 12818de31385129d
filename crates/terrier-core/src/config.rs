//! Stage configuration with documented defaults.
//!
//! Every tolerance the stages consult lives here and is passed in
//! explicitly; there is no process-wide mutable state. Several defaults
//! (merge 5 ft, label proximity 50 ft, depth buckets at 5/8/12 ft) are
//! field heuristics inherited from prior takeoff work, not domain-validated
//! constants.

use crate::model::Discipline;

/// Scale-bar fallback search parameters, in drawing units.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleConfig {
    /// Maximum distance from a bar's midpoint to its distance label.
    pub bar_label_max_dist: f64,
    /// Candidate bars shorter than this are dismissed as tick marks.
    pub bar_min_len: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            bar_label_max_dist: 30.0,
            bar_min_len: 5.0,
        }
    }
}

/// Symbol-matching heuristics, extents in world feet.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Stroke widths at or above this read as doubled/hatched linework.
    pub double_stroke_min_width: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            double_stroke_min_width: 1.5,
        }
    }
}

/// Graph reconstruction tolerances, in world feet.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Endpoints closer than this merge into one continuous pipe run.
    pub merge_tolerance_ft: f64,
    /// Edge endpoints snap to a node within this radius.
    pub node_snap_tolerance_ft: f64,
    /// An inferred crossing this close to an existing node is not a new junction.
    pub junction_tolerance_ft: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            merge_tolerance_ft: 5.0,
            node_snap_tolerance_ft: 5.0,
            junction_tolerance_ft: 5.0,
        }
    }
}

/// Label proximity search, in world feet.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelConfig {
    /// Drawings label features loosely; annotations within this distance of
    /// an element are considered to describe it.
    pub proximity_ft: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self { proximity_ft: 50.0 }
    }
}

/// Trench sampling and sizing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthConfig {
    /// Evenly spaced stations sampled along each run.
    pub sample_count: usize,
    /// Clearance each side of the pipe barrel, feet.
    pub bedding_clearance_ft: f64,
    /// Horizontal run per foot of depth on each trench wall.
    pub side_slope_ratio: f64,
    /// Excavations deeper than this require protective systems (OSHA 1926.652).
    pub osha_trigger_depth_ft: f64,
    pub storm_min_cover_ft: f64,
    pub sanitary_min_cover_ft: f64,
    pub water_min_cover_ft: f64,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            sample_count: 20,
            bedding_clearance_ft: 0.5,
            side_slope_ratio: 0.5,
            osha_trigger_depth_ft: 5.0,
            storm_min_cover_ft: 1.5,
            sanitary_min_cover_ft: 2.5,
            water_min_cover_ft: 3.0,
        }
    }
}

impl DepthConfig {
    pub fn min_cover_ft(&self, discipline: Discipline) -> f64 {
        match discipline {
            Discipline::Storm => self.storm_min_cover_ft,
            Discipline::Sanitary => self.sanitary_min_cover_ft,
            Discipline::Water => self.water_min_cover_ft,
        }
    }
}

/// Rule thresholds for the QA pass. Slopes are percentages (0.5 = 0.5%).
#[derive(Debug, Clone, PartialEq)]
pub struct QaConfig {
    pub storm_slope_range_pct: Option<(f64, f64)>,
    pub sanitary_slope_range_pct: Option<(f64, f64)>,
    /// Pressurized mains carry no gravity-slope rule by default.
    pub water_slope_range_pct: Option<(f64, f64)>,
    pub ada_max_ramp_slope_pct: f64,
    pub ada_min_ramp_width_ft: f64,
    /// Relative cut/fill disagreement above this fraction is flagged.
    pub schedule_tolerance: f64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            storm_slope_range_pct: Some((0.5, 10.0)),
            sanitary_slope_range_pct: Some((0.5, 10.0)),
            water_slope_range_pct: None,
            ada_max_ramp_slope_pct: 8.33,
            ada_min_ramp_width_ft: 3.0,
            schedule_tolerance: 0.10,
        }
    }
}

impl QaConfig {
    pub fn slope_range_pct(&self, discipline: Discipline) -> Option<(f64, f64)> {
        match discipline {
            Discipline::Storm => self.storm_slope_range_pct,
            Discipline::Sanitary => self.sanitary_slope_range_pct,
            Discipline::Water => self.water_slope_range_pct,
        }
    }
}

/// Aggregate configuration for a full page run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub scale: ScaleConfig,
    pub matching: MatchConfig,
    pub graph: GraphConfig,
    pub labels: LabelConfig,
    pub depth: DepthConfig,
    pub qa: QaConfig,
}
