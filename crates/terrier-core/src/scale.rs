//! Scale resolution: drawing units -> world feet.
//!
//! Text patterns are tried in a fixed priority order across the whole page;
//! the first match wins and the resulting transform is reused for every
//! element on that page. A graphic scale bar is the fallback, and when
//! neither method lands the page runs in a flagged identity mode rather
//! than failing.

use crate::config::ScaleConfig;
use crate::geom::{self, Point, Transform};
use crate::model::{PrimitiveKind, TextToken, VectorPrimitive};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleSource {
    /// Derived from a textual scale note.
    Text,
    /// Derived from a graphic scale bar and its distance label.
    Bar,
    /// No scale found; identity (1 drawing unit = 1 ft) in effect. Results
    /// downstream are uncalibrated and must be surfaced as such.
    Unknown,
}

/// Affine drawing-units -> world-feet mapping for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleTransform {
    pub transform: Transform,
    /// The scale note the transform was derived from, when there was one.
    pub source_text: Option<String>,
    pub source: ScaleSource,
}

impl ScaleTransform {
    /// Uniform scale; rejects non-positive or non-finite factors so a
    /// malformed note can never poison a page.
    pub fn from_feet_per_unit(
        feet_per_unit: f64,
        source_text: Option<String>,
        source: ScaleSource,
    ) -> Option<Self> {
        if !feet_per_unit.is_finite() || feet_per_unit <= 0.0 {
            return None;
        }
        Some(Self {
            transform: Transform::scale(feet_per_unit, feet_per_unit),
            source_text,
            source,
        })
    }

    /// Degraded mode: 1 drawing unit = 1 foot, flagged `Unknown`.
    pub fn identity_unknown() -> Self {
        Self {
            transform: Transform::identity(),
            source_text: None,
            source: ScaleSource::Unknown,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.source != ScaleSource::Unknown
    }

    pub fn apply(&self, p: Point) -> Point {
        self.transform.transform_point(p)
    }

    pub fn feet_per_unit(&self) -> f64 {
        self.transform.m11
    }
}

fn inch_feet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(\d+(?:\.\d+)?)\s*(?:"|”|'')\s*=\s*(\d+(?:\.\d+)?)\s*(?:'|’|ft\b|feet\b)"#)
            .unwrap()
    })
}

fn unit_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(\d+(?:\.\d+)?)\s*(?:in|inch|inches)\.?\s*=\s*(\d+(?:\.\d+)?)\s*(?:ft|feet|foot)\.?",
        )
        .unwrap()
    })
}

fn ratio_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d+)\s*[:/]\s*(\d+)\b").unwrap())
}

fn bar_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*(?:'|ft|feet)?\s*$").unwrap()
    })
}

/// Both note families reduce to feet-per-unit = second capture / first:
/// `N" = M'` gives M/N, `N:M` gives M/N.
fn feet_per_unit_from_captures(num: &str, feet: &str) -> Option<f64> {
    let a: f64 = num.parse().ok()?;
    let b: f64 = feet.parse().ok()?;
    if a <= 0.0 {
        return None;
    }
    Some(b / a)
}

/// Scans tokens for a scale note. Returns the first match in pattern
/// priority order (inch-feet, then ratio, then word form).
fn resolve_from_text(texts: &[TextToken]) -> Option<ScaleTransform> {
    const PATTERNS: [(&str, fn() -> &'static Regex); 3] = [
        ("inch-feet", inch_feet_re as fn() -> &'static Regex),
        ("ratio", ratio_re as fn() -> &'static Regex),
        ("unit-word", unit_word_re as fn() -> &'static Regex),
    ];

    for (name, re) in PATTERNS {
        for tok in texts {
            let Some(caps) = re().captures(&tok.content) else {
                continue;
            };
            // Malformed numerics are non-matches; keep scanning.
            let Some(fpu) = feet_per_unit_from_captures(&caps[1], &caps[2]) else {
                continue;
            };
            if let Some(t) =
                ScaleTransform::from_feet_per_unit(fpu, Some(tok.content.clone()), ScaleSource::Text)
            {
                debug!(pattern = name, text = %tok.content, feet_per_unit = fpu, "scale from text");
                return Some(t);
            }
        }
    }
    None
}

/// Fallback: a short straight stroke with a numeric distance label near its
/// midpoint. The shortest qualifying bar wins (legend bars are compact).
fn resolve_from_bar(
    primitives: &[VectorPrimitive],
    texts: &[TextToken],
    cfg: &ScaleConfig,
) -> Option<ScaleTransform> {
    let mut best: Option<(f64, f64, String)> = None; // (bar_len, labeled_ft, label)
    for prim in primitives {
        if !matches!(prim.kind, PrimitiveKind::Line | PrimitiveKind::Polyline) {
            continue;
        }
        let [a, b] = prim.points[..] else { continue };
        let len = (b - a).length();
        if len < cfg.bar_min_len {
            continue;
        }
        let mid = geom::point((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        for tok in texts {
            let Some(caps) = bar_label_re().captures(&tok.content) else {
                continue;
            };
            let Ok(feet) = caps[1].parse::<f64>() else {
                continue;
            };
            if feet <= 0.0 || (tok.center() - mid).length() > cfg.bar_label_max_dist {
                continue;
            }
            if best.as_ref().map_or(true, |(bl, _, _)| len < *bl) {
                best = Some((len, feet, tok.content.trim().to_string()));
            }
        }
    }
    let (bar_len, feet, label) = best?;
    let t = ScaleTransform::from_feet_per_unit(feet / bar_len, Some(label), ScaleSource::Bar)?;
    debug!(bar_len, feet, "scale from graphic bar");
    Some(t)
}

/// Resolves one page's scale. Never fails: pages with no recognizable scale
/// come back as flagged identity transforms.
pub fn resolve_scale(
    texts: &[TextToken],
    primitives: &[VectorPrimitive],
    cfg: &ScaleConfig,
) -> ScaleTransform {
    if let Some(t) = resolve_from_text(texts) {
        return t;
    }
    if let Some(t) = resolve_from_bar(primitives, texts, cfg) {
        return t;
    }
    warn!("no scale note or bar found; page runs uncalibrated (1 unit = 1 ft)");
    ScaleTransform::identity_unknown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Rect, Size, point};

    fn tok(s: &str, x: f64, y: f64) -> TextToken {
        TextToken::new(s, Rect::new(point(x, y), Size::new(10.0, 4.0)))
    }

    #[test]
    fn inch_feet_note_scales_unit_segment() {
        // Scenario: `1" = 50'` must map a 2-unit segment to 100 ft.
        let t = resolve_scale(&[tok("1\" = 50'", 0.0, 0.0)], &[], &ScaleConfig::default());
        assert_eq!(t.source, ScaleSource::Text);
        let a = t.apply(point(0.0, 0.0));
        let b = t.apply(point(2.0, 0.0));
        assert!(((b - a).length() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn word_form_and_ratio_notes_parse() {
        let t = resolve_scale(
            &[tok("1 inch = 20 feet", 0.0, 0.0)],
            &[],
            &ScaleConfig::default(),
        );
        assert!((t.feet_per_unit() - 20.0).abs() < 1e-9);

        let t = resolve_scale(&[tok("SCALE 1:1000", 0.0, 0.0)], &[], &ScaleConfig::default());
        assert!((t.feet_per_unit() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn inch_feet_wins_over_ratio() {
        // Pattern priority is fixed, independent of token order.
        let texts = [tok("1:1000", 0.0, 0.0), tok("1\" = 30'", 0.0, 50.0)];
        let t = resolve_scale(&texts, &[], &ScaleConfig::default());
        assert!((t.feet_per_unit() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn ratio_outranks_word_form() {
        let texts = [
            tok("1 inch = 20 feet", 0.0, 0.0),
            tok("SCALE 1:1000", 0.0, 50.0),
        ];
        let t = resolve_scale(&texts, &[], &ScaleConfig::default());
        assert!((t.feet_per_unit() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_notes_fall_through_to_unknown() {
        let texts = [tok("scale: yes", 0.0, 0.0), tok("0\" = 50'", 0.0, 10.0)];
        let t = resolve_scale(&texts, &[], &ScaleConfig::default());
        assert_eq!(t.source, ScaleSource::Unknown);
        assert!(!t.is_calibrated());
        assert!((t.feet_per_unit() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bar_fallback_uses_labeled_length() {
        use crate::model::{PrimitiveKind, VectorPrimitive};
        let bar = VectorPrimitive::new(
            PrimitiveKind::Line,
            vec![point(100.0, 100.0), point(150.0, 100.0)],
        );
        let texts = [tok("50'", 120.0, 104.0)];
        let t = resolve_scale(&texts, &[bar], &ScaleConfig::default());
        assert_eq!(t.source, ScaleSource::Bar);
        assert!((t.feet_per_unit() - 1.0).abs() < 1e-9);
    }
}
