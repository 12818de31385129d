//! Depth analysis: sample a pipe run's invert profile against the ground
//! surface and size the trench around it.
//!
//! The ground-elevation function is an external collaborator (contour
//! triangulation, survey TIN, whatever the caller has); here it is only a
//! `station -> feet` lookup. An empty invert profile is a degraded input,
//! not an error: the summary comes back all zeros with nothing flagged,
//! because absence of data must not read as a violation.

use crate::config::DepthConfig;
use crate::error::{Error, Result};
use crate::model::Discipline;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One station's worth of trench math. Ephemeral; only the summary is
/// attached to the edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSample {
    /// Normalized 0..1 position along the run.
    pub station: f64,
    pub invert_elev_ft: f64,
    pub ground_elev_ft: f64,
    /// Ground minus invert.
    pub depth_ft: f64,
    /// Depth minus the pipe's outer radius.
    pub cover_ft: f64,
    pub trench_width_ft: f64,
    /// Trapezoidal cross-section: vertical below, sloped walls above.
    pub trench_area_sqft: f64,
}

/// Length-weighted depth ranges, feet. Bucket boundaries (5/8/12) follow
/// common excavation pricing tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthBuckets {
    #[serde(rename = "0-5")]
    pub ft_0_5: f64,
    #[serde(rename = "5-8")]
    pub ft_5_8: f64,
    #[serde(rename = "8-12")]
    pub ft_8_12: f64,
    #[serde(rename = "12+")]
    pub ft_12_plus: f64,
}

impl DepthBuckets {
    pub fn total_ft(&self) -> f64 {
        self.ft_0_5 + self.ft_5_8 + self.ft_8_12 + self.ft_12_plus
    }

    fn add(&mut self, depth_ft: f64, share_ft: f64) {
        if depth_ft < 5.0 {
            self.ft_0_5 += share_ft;
        } else if depth_ft < 8.0 {
            self.ft_5_8 += share_ft;
        } else if depth_ft < 12.0 {
            self.ft_8_12 += share_ft;
        } else {
            self.ft_12_plus += share_ft;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthSummary {
    /// Stations actually sampled; 0 means no invert data existed and every
    /// other field is a placeholder zero, not a measurement.
    pub samples: usize,
    pub min_depth_ft: f64,
    pub max_depth_ft: f64,
    pub avg_depth_ft: f64,
    pub p95_depth_ft: f64,
    pub buckets: DepthBuckets,
    pub trench_volume_cu_yd: f64,
    /// Worst (smallest) cover across samples.
    pub min_cover_ft: f64,
    /// Every sample met the discipline's minimum cover; ties at the
    /// boundary count as met. The QA pass reports from this flag.
    pub cover_ok: bool,
    /// Max depth exceeded the OSHA protective-system trigger.
    pub deep_excavation: bool,
}

/// Nominal-to-outer diameter, inches. Sparse; sizes or materials outside
/// the table fall back to nominal x 1.2.
pub fn outer_diameter_in(material: Option<&str>, nominal_in: f64) -> f64 {
    let key = nominal_in.round() as i64;
    let mat = material.map(str::to_ascii_uppercase);
    let looked_up = match (mat.as_deref(), key) {
        (Some("PVC"), 4) => Some(4.215),
        (Some("PVC"), 6) => Some(6.275),
        (Some("PVC"), 8) => Some(8.4),
        (Some("PVC"), 10) => Some(10.5),
        (Some("PVC"), 12) => Some(12.5),
        (Some("PVC"), 15) => Some(15.3),
        (Some("PVC"), 18) => Some(18.701),
        (Some("DIP" | "DI"), 4) => Some(4.8),
        (Some("DIP" | "DI"), 6) => Some(6.9),
        (Some("DIP" | "DI"), 8) => Some(9.05),
        (Some("DIP" | "DI"), 10) => Some(11.1),
        (Some("DIP" | "DI"), 12) => Some(13.2),
        (Some("DIP" | "DI"), 16) => Some(17.4),
        (Some("HDPE"), 4) => Some(4.5),
        (Some("HDPE"), 6) => Some(6.625),
        (Some("HDPE"), 8) => Some(8.625),
        (Some("HDPE"), 10) => Some(10.75),
        (Some("HDPE"), 12) => Some(12.75),
        (Some("RCP"), 12) => Some(15.0),
        (Some("RCP"), 15) => Some(18.75),
        (Some("RCP"), 18) => Some(22.5),
        (Some("RCP"), 24) => Some(30.0),
        (Some("RCP"), 36) => Some(44.0),
        _ => None,
    };
    looked_up.unwrap_or(nominal_in * 1.2)
}

/// Piecewise-linear invert elevation at `station`. Outside the profile's
/// span, the nearest segment's grade extends; a single-point profile is a
/// constant.
fn interpolate_invert(profile: &[(f64, f64)], station: f64) -> f64 {
    match profile {
        [] => 0.0,
        [(_, elev)] => *elev,
        _ => {
            let seg = if station <= profile[0].0 {
                (profile[0], profile[1])
            } else if station >= profile[profile.len() - 1].0 {
                (profile[profile.len() - 2], profile[profile.len() - 1])
            } else {
                let idx = profile
                    .windows(2)
                    .position(|w| station <= w[1].0)
                    .unwrap_or(profile.len() - 2);
                (profile[idx], profile[idx + 1])
            };
            let ((s0, e0), (s1, e1)) = seg;
            let span = s1 - s0;
            if span.abs() <= f64::EPSILON {
                e0
            } else {
                e0 + (station - s0) * (e1 - e0) / span
            }
        }
    }
}

/// Samples the trench at `cfg.sample_count` evenly spaced stations in
/// [0, 1]. The profile may arrive unsorted; an empty profile yields no
/// samples.
pub fn sample_profile(
    profile: &[(f64, f64)],
    ground_elev_ft: &dyn Fn(f64) -> f64,
    material: Option<&str>,
    nominal_diameter_in: f64,
    cfg: &DepthConfig,
) -> Result<Vec<DepthSample>> {
    if cfg.sample_count == 0 {
        return Err(Error::InvalidSampleCount);
    }
    if profile.is_empty() {
        return Ok(Vec::new());
    }
    let mut profile: Vec<(f64, f64)> = profile.to_vec();
    profile.sort_by(|a, b| a.0.total_cmp(&b.0));

    let od_ft = outer_diameter_in(material, nominal_diameter_in) / 12.0;
    let n = cfg.sample_count;
    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let station = if n == 1 { 0.0 } else { i as f64 / (n - 1) as f64 };
        let invert = interpolate_invert(&profile, station);
        let ground = ground_elev_ft(station);
        let depth = ground - invert;
        let cover = depth - od_ft / 2.0;
        let trench_width = od_ft + 2.0 * cfg.bedding_clearance_ft;
        let wall_height = depth.max(0.0);
        let top_width = trench_width + 2.0 * wall_height * cfg.side_slope_ratio;
        let trench_area = (trench_width + top_width) / 2.0 * wall_height;
        samples.push(DepthSample {
            station,
            invert_elev_ft: invert,
            ground_elev_ft: ground,
            depth_ft: depth,
            cover_ft: cover,
            trench_width_ft: trench_width,
            trench_area_sqft: trench_area,
        });
    }
    Ok(samples)
}

/// Absorbs float rounding in the ground/invert arithmetic so cover landing
/// exactly on the minimum reads as compliant.
const COVER_EPS: f64 = 1e-9;

/// Full depth analysis for one run. `run_length_ft` weights the buckets and
/// the volume; each sample stands for `run_length_ft / N` feet of trench.
pub fn analyze_depth(
    profile: &[(f64, f64)],
    ground_elev_ft: &dyn Fn(f64) -> f64,
    material: Option<&str>,
    nominal_diameter_in: f64,
    discipline: Discipline,
    run_length_ft: f64,
    cfg: &DepthConfig,
) -> Result<DepthSummary> {
    let samples = sample_profile(profile, ground_elev_ft, material, nominal_diameter_in, cfg)?;
    if samples.is_empty() {
        debug!(%discipline, "no invert profile; zero depth summary");
        return Ok(DepthSummary {
            cover_ok: true,
            ..DepthSummary::default()
        });
    }

    let n = samples.len();
    let share_ft = run_length_ft / n as f64;
    let min_cover = cfg.min_cover_ft(discipline);

    let mut buckets = DepthBuckets::default();
    let mut volume_cu_ft = 0.0;
    let (mut min_d, mut max_d, mut sum_d) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
    let mut worst_cover = f64::INFINITY;
    let mut cover_ok = true;
    for s in &samples {
        buckets.add(s.depth_ft, share_ft);
        volume_cu_ft += s.trench_area_sqft * share_ft;
        min_d = min_d.min(s.depth_ft);
        max_d = max_d.max(s.depth_ft);
        sum_d += s.depth_ft;
        worst_cover = worst_cover.min(s.cover_ft);
        if s.cover_ft < min_cover - COVER_EPS {
            cover_ok = false;
        }
    }

    let mut depths: Vec<f64> = samples.iter().map(|s| s.depth_ft).collect();
    depths.sort_by(f64::total_cmp);
    let p95 = depths[((0.95 * n as f64).floor() as usize).min(n - 1)];

    Ok(DepthSummary {
        samples: n,
        min_depth_ft: min_d,
        max_depth_ft: max_d,
        avg_depth_ft: sum_d / n as f64,
        p95_depth_ft: p95,
        buckets,
        trench_volume_cu_yd: volume_cu_ft / 27.0,
        min_cover_ft: worst_cover,
        cover_ok,
        deep_excavation: max_d > cfg.osha_trigger_depth_ft,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAT_GROUND: fn(f64) -> f64 = |_| 105.0;

    #[test]
    fn falling_run_depth_spans_five_to_ten() {
        // Invert drops 100 -> 95 under flat ground at 105: depth grows
        // linearly from 5 to 10 ft and trips the shoring trigger.
        let cfg = DepthConfig {
            sample_count: 10,
            ..Default::default()
        };
        let profile = [(0.0, 100.0), (1.0, 95.0)];
        let summary = analyze_depth(
            &profile,
            &FLAT_GROUND,
            Some("pvc"),
            12.0,
            Discipline::Storm,
            200.0,
            &cfg,
        )
        .unwrap();

        assert!((summary.min_depth_ft - 5.0).abs() < 1e-9);
        assert!((summary.max_depth_ft - 10.0).abs() < 1e-9);
        assert!(summary.deep_excavation);
        assert!(summary.cover_ok); // storm minimum is 1.5 ft
        assert!(summary.min_depth_ft <= summary.avg_depth_ft);
        assert!(summary.avg_depth_ft <= summary.p95_depth_ft);
        assert!(summary.p95_depth_ft <= summary.max_depth_ft);
    }

    #[test]
    fn buckets_sum_to_run_length() {
        let cfg = DepthConfig::default();
        let profile = [(0.0, 101.0), (0.5, 94.0), (1.0, 90.0)];
        let summary = analyze_depth(
            &profile,
            &FLAT_GROUND,
            Some("rcp"),
            18.0,
            Discipline::Storm,
            350.0,
            &cfg,
        )
        .unwrap();
        assert!((summary.buckets.total_ft() - 350.0).abs() < 1e-6);
        assert!(summary.trench_volume_cu_yd > 0.0);
    }

    #[test]
    fn cover_boundary_is_inclusive() {
        // Engineer the cover to land exactly on the water minimum (3.0 ft):
        // od(pvc, 12) = 12.5 in, radius 0.5208 ft, so depth 3.5208 ft.
        let od_radius_ft = outer_diameter_in(Some("PVC"), 12.0) / 12.0 / 2.0;
        let depth = 3.0 + od_radius_ft;
        let profile = [(0.0, 100.0), (1.0, 100.0)];
        let ground = move |_s: f64| 100.0 + depth;
        let cfg = DepthConfig::default();

        let at_minimum = analyze_depth(
            &profile,
            &ground,
            Some("pvc"),
            12.0,
            Discipline::Water,
            100.0,
            &cfg,
        )
        .unwrap();
        // The recovered cover may sit a few ulps either side of 3.0; the
        // boundary still counts as compliant.
        assert!((at_minimum.min_cover_ft - 3.0).abs() < 1e-9);
        assert!(at_minimum.cover_ok);

        let shallow = move |_s: f64| 100.0 + depth - 0.01;
        let below_minimum = analyze_depth(
            &profile,
            &shallow,
            Some("pvc"),
            12.0,
            Discipline::Water,
            100.0,
            &cfg,
        )
        .unwrap();
        assert!(!below_minimum.cover_ok);
        assert!(below_minimum.min_cover_ft < 3.0);
    }

    #[test]
    fn empty_profile_yields_quiet_zero_summary() {
        let summary = analyze_depth(
            &[],
            &FLAT_GROUND,
            None,
            8.0,
            Discipline::Sanitary,
            120.0,
            &DepthConfig::default(),
        )
        .unwrap();
        assert_eq!(summary, DepthSummary {
            cover_ok: true,
            ..DepthSummary::default()
        });
        assert!(!summary.deep_excavation);
    }

    #[test]
    fn zero_sample_count_is_a_contract_violation() {
        let cfg = DepthConfig {
            sample_count: 0,
            ..Default::default()
        };
        let err = analyze_depth(
            &[(0.0, 100.0), (1.0, 99.0)],
            &FLAT_GROUND,
            None,
            8.0,
            Discipline::Sanitary,
            100.0,
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidSampleCount));
    }

    #[test]
    fn extrapolation_extends_end_grades() {
        // Profile covering only the middle; ends extend at +/- the nearest
        // segment's grade.
        let profile = [(0.25, 100.0), (0.75, 98.0)];
        assert!((interpolate_invert(&profile, 0.5) - 99.0).abs() < 1e-9);
        assert!((interpolate_invert(&profile, 0.0) - 101.0).abs() < 1e-9);
        assert!((interpolate_invert(&profile, 1.0) - 97.0).abs() < 1e-9);
    }

    #[test]
    fn od_lookup_falls_back_to_scaled_nominal() {
        assert!((outer_diameter_in(Some("PVC"), 12.0) - 12.5).abs() < 1e-9);
        assert!((outer_diameter_in(Some("clay"), 12.0) - 14.4).abs() < 1e-9);
        assert!((outer_diameter_in(None, 10.0) - 12.0).abs() < 1e-9);
    }
}
