//! Symbol matching: classify one primitive against the catalog.
//!
//! A pure function of its inputs. When several entries match, the one whose
//! legend name contains the caller's context keyword wins; remaining ties go
//! to the first-registered entry, so results are reproducible for a given
//! catalog ordering.

use crate::catalog::{SymbolCatalog, SymbolCatalogEntry, SymbolCategory};
use crate::config::MatchConfig;
use crate::model::{Discipline, VectorPrimitive};

/// Classifies `prim` against every catalog entry. `context` is an optional
/// keyword naming what the caller is probing for (e.g. `"valve"`); entries
/// whose name contains it beat entries whose name does not.
pub fn match_symbol<'a>(
    prim: &VectorPrimitive,
    catalog: &'a SymbolCatalog,
    context: Option<&str>,
    cfg: &MatchConfig,
) -> Option<&'a SymbolCatalogEntry> {
    select(
        catalog.entries().iter().filter(|e| e.predicate.matches(prim, cfg)),
        context,
    )
}

/// As [`match_symbol`], restricted to node-category entries usable on
/// `discipline` sheets.
pub fn match_node_symbol<'a>(
    prim: &VectorPrimitive,
    catalog: &'a SymbolCatalog,
    discipline: Discipline,
    context: Option<&str>,
    cfg: &MatchConfig,
) -> Option<&'a SymbolCatalogEntry> {
    select(
        catalog.entries().iter().filter(|e| {
            matches!(e.category, SymbolCategory::Node { discipline: d, .. }
                if d.is_none_or(|d| d == discipline))
                && e.predicate.matches(prim, cfg)
        }),
        context,
    )
}

/// As [`match_symbol`], restricted to `discipline` pipe entries.
pub fn match_pipe_symbol<'a>(
    prim: &VectorPrimitive,
    catalog: &'a SymbolCatalog,
    discipline: Discipline,
    cfg: &MatchConfig,
) -> Option<&'a SymbolCatalogEntry> {
    select(
        catalog.entries().iter().filter(|e| {
            matches!(e.category, SymbolCategory::Pipe { discipline: d } if d == discipline)
                && e.predicate.matches(prim, cfg)
        }),
        None,
    )
}

fn select<'a>(
    candidates: impl Iterator<Item = &'a SymbolCatalogEntry>,
    context: Option<&str>,
) -> Option<&'a SymbolCatalogEntry> {
    let mut best: Option<(&SymbolCatalogEntry, bool)> = None;
    for entry in candidates {
        let specific = context.is_some_and(|kw| {
            entry.name.to_ascii_lowercase().contains(&kw.to_ascii_lowercase())
        });
        match &best {
            // First-registered wins among equally specific entries.
            Some((_, best_specific)) if *best_specific || !specific => {}
            _ => best = Some((entry, specific)),
        }
    }
    best.map(|(e, _)| e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SymbolCatalogEntry, SymbolPredicate};
    use crate::geom::point;
    use crate::model::PrimitiveKind;
    use crate::network::NodeKind;

    fn circle_entry(name: &str, kind: NodeKind) -> SymbolCatalogEntry {
        SymbolCatalogEntry {
            name: name.to_string(),
            category: SymbolCategory::Node {
                kind,
                discipline: Some(Discipline::Water),
            },
            predicate: SymbolPredicate {
                shape: Some(PrimitiveKind::Circle),
                ..Default::default()
            },
            label_patterns: Vec::new(),
        }
    }

    fn small_circle() -> VectorPrimitive {
        VectorPrimitive::new(
            PrimitiveKind::Circle,
            vec![point(0.0, 0.0), point(2.0, 0.0), point(2.0, 2.0), point(0.0, 2.0)],
        )
    }

    #[test]
    fn context_keyword_beats_generic_entry() {
        let mut catalog = SymbolCatalog::new();
        catalog.register(circle_entry("water fitting", NodeKind::Unknown));
        catalog.register(circle_entry("water gate valve", NodeKind::Valve));

        let cfg = MatchConfig::default();
        let hit = match_symbol(&small_circle(), &catalog, Some("valve"), &cfg).unwrap();
        assert_eq!(hit.name, "water gate valve");
    }

    #[test]
    fn first_registered_wins_on_ties() {
        let mut catalog = SymbolCatalog::new();
        catalog.register(circle_entry("water meter a", NodeKind::Meter));
        catalog.register(circle_entry("water meter b", NodeKind::Meter));

        let cfg = MatchConfig::default();
        let hit = match_symbol(&small_circle(), &catalog, Some("meter"), &cfg).unwrap();
        assert_eq!(hit.name, "water meter a");
        // Stable without a context too.
        let hit = match_symbol(&small_circle(), &catalog, None, &cfg).unwrap();
        assert_eq!(hit.name, "water meter a");
    }

    #[test]
    fn predicate_gates_on_extent() {
        let mut catalog = SymbolCatalog::new();
        let mut entry = circle_entry("water valve", NodeKind::Valve);
        entry.predicate.max_extent_ft = Some(1.0);
        catalog.register(entry);

        // 2 ft circle exceeds the small-fitting extent cap.
        assert!(match_symbol(&small_circle(), &catalog, None, &MatchConfig::default()).is_none());
    }

    #[test]
    fn no_match_is_none_not_error() {
        let catalog = SymbolCatalog::new();
        assert!(match_symbol(&small_circle(), &catalog, None, &MatchConfig::default()).is_none());
    }
}
