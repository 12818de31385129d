//! Label attachment: parse nearby annotation text into structured edge/node
//! attributes.
//!
//! Purely additive; geometry is never touched. Every extraction is
//! tolerant: a token that parses as nothing contributes nothing. When two
//! nearby tokens disagree on the same attribute, the last one found wins —
//! drawings are routinely over-annotated and averaging would manufacture
//! values nobody wrote.

use crate::catalog::SymbolCatalog;
use crate::config::LabelConfig;
use crate::geom;
use crate::model::{AttrValue, TextToken};
use crate::network::{Edge, Node, NodeKind};
use crate::scale::ScaleTransform;
use regex::Regex;
use std::sync::OnceLock;

/// Material vocabulary seen on utility sheets. Matched on word boundaries,
/// case-insensitively; first vocabulary hit in a token names the material.
const MATERIALS: [&str; 11] = [
    "PVC", "DIP", "HDPE", "RCP", "CMP", "VCP", "CPP", "STEEL", "COPPER", "PEX", "DI",
];

fn diameter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(?:\bDIA\.?\s*(\d+(?:\.\d+)?)|(\d+(?:\.\d+)?)\s*(?:"|”|''|\bin\b|\binch\b))"#)
            .unwrap()
    })
}

fn slope_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:(\d+(?:\.\d+)?)\s*%|\bS\s*=\s*(0?\.\d+)\b)").unwrap()
    })
}

fn pressure_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*PSI\b").unwrap())
}

fn flow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*GPM\b").unwrap())
}

fn rim_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bRIM\.?\s*[:=]?\s*(\d+(?:\.\d+)?)").unwrap())
}

fn invert_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bINV(?:ERT)?\.?\s*[:=]?\s*(\d+(?:\.\d+)?)").unwrap())
}

fn material_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = MATERIALS.join("|");
        Regex::new(&format!(r"(?i)\b({alternation})\b")).unwrap()
    })
}

fn parse_diameter_in(text: &str) -> Option<f64> {
    let caps = diameter_re().captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

fn parse_slope_pct(text: &str) -> Option<f64> {
    let caps = slope_re().captures(text)?;
    if let Some(pct) = caps.get(1) {
        return pct.as_str().parse().ok();
    }
    // `S=0.005` is a ft/ft ratio.
    caps.get(2)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|r| r * 100.0)
}

fn parse_material(text: &str) -> Option<String> {
    material_re()
        .captures(text)
        .map(|c| c[1].to_ascii_uppercase())
}

fn capture_number(text: &str, re: &Regex) -> Option<f64> {
    re.captures(text).and_then(|c| c[1].parse().ok())
}

fn valve_subtype(text: &str) -> Option<&'static str> {
    let t = text.to_ascii_lowercase();
    for (kw, name) in [
        ("butterfly", "butterfly"),
        ("gate", "gate"),
        ("check", "check"),
        ("prv", "prv"),
        ("pressure reducing", "prv"),
    ] {
        if t.contains(kw) {
            return Some(name);
        }
    }
    None
}

/// Parses pipe attributes from annotations near `edge` (tokens whose
/// world-space center lies within the proximity tolerance of the
/// centerline, visited in page order). Geometry and already-set attributes
/// survive unless a later token re-states them.
pub fn attach_edge_labels(
    edge: &mut Edge,
    texts: &[TextToken],
    scale: &ScaleTransform,
    cfg: &LabelConfig,
) {
    for tok in texts {
        if geom::distance_to_polyline(scale.apply(tok.center()), &edge.points) > cfg.proximity_ft {
            continue;
        }
        let s = tok.content.as_str();
        if let Some(d) = parse_diameter_in(s) {
            edge.diameter_in = Some(d);
        }
        if let Some(m) = parse_material(s) {
            edge.material = Some(m);
        }
        if let Some(pct) = parse_slope_pct(s) {
            edge.slope_pct = Some(pct);
        }
        if let Some(psi) = capture_number(s, pressure_re()) {
            edge.set_attr("pressure_psi", psi);
        }
        if let Some(gpm) = capture_number(s, flow_re()) {
            edge.set_attr("flow_gpm", gpm);
        }
    }
}

/// Parses structure attributes from annotations near `node`. When the node
/// was matched from a catalog entry carrying label patterns (structure tags
/// like `MH-\d+`), a nearby tag is recorded under `"tag"`.
pub fn attach_node_labels(
    node: &mut Node,
    texts: &[TextToken],
    scale: &ScaleTransform,
    catalog: Option<&SymbolCatalog>,
    cfg: &LabelConfig,
) {
    let tag_patterns: Vec<Regex> = node
        .attrs
        .get("symbol")
        .and_then(AttrValue::as_text)
        .and_then(|name| catalog?.entry_by_name(name))
        .map(|entry| {
            entry
                .label_patterns
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect()
        })
        .unwrap_or_default();

    let center = node.position();
    for tok in texts {
        if (scale.apply(tok.center()) - center).length() > cfg.proximity_ft {
            continue;
        }
        let s = tok.content.as_str();
        if let Some(d) = parse_diameter_in(s) {
            node.set_attr("diameter_in", d);
        }
        if let Some(m) = parse_material(s) {
            node.set_attr("material", m.as_str());
        }
        if let Some(rim) = capture_number(s, rim_re()) {
            node.set_attr("rim_elev_ft", rim);
        }
        if let Some(inv) = capture_number(s, invert_re()) {
            node.set_attr("invert_elev_ft", inv);
        }
        if node.kind == NodeKind::Valve {
            if let Some(sub) = valve_subtype(s) {
                node.set_attr("valve_type", sub);
            }
        }
        if node.kind == NodeKind::Hydrant && s.to_ascii_lowercase().contains("hydrant") {
            node.set_attr("hydrant", true);
        }
        for re in &tag_patterns {
            if let Some(m) = re.find(s) {
                node.set_attr("tag", m.as_str());
            }
        }
    }
}
