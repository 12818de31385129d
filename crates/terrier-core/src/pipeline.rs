//! Per-page orchestration: scale, then per-discipline reconstruction,
//! labeling, depth analysis, and QA.
//!
//! Disciplines touch disjoint data, so the parallel variant fans them out
//! on scoped threads with the catalog and scale shared read-only; results
//! merge by concatenation in fixed discipline order, making the two
//! variants bit-identical.

use crate::catalog::SymbolCatalog;
use crate::config::PipelineConfig;
use crate::depth;
use crate::error::Result;
use crate::graph;
use crate::label;
use crate::model::{AttrValue, Discipline, TextToken, VectorPrimitive};
use crate::network::{Edge, Network};
use crate::qa::{self, EarthworkTotals, QAViolation, Severity};
use crate::scale::{self, ScaleTransform};
use rustc_hash::FxHashMap;
use tracing::info;

/// Ground elevation for a station along a specific edge, supplied by the
/// surface-model collaborator.
pub type GroundElevationFn<'a> = &'a (dyn Fn(&Edge, f64) -> f64 + Sync);

/// Cut/fill totals to reconcile: what was measured versus what the
/// drawing's earthwork schedule states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleCheck {
    pub measured: EarthworkTotals,
    pub table: EarthworkTotals,
}

/// One page's worth of ingested content, in drawing units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageInput {
    pub primitives: Vec<VectorPrimitive>,
    pub texts: Vec<TextToken>,
    pub earthwork: Option<ScheduleCheck>,
}

#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub scale: ScaleTransform,
    /// One network per discipline, in [`Discipline::ALL`] order.
    pub networks: Vec<Network>,
    pub violations: Vec<QAViolation>,
}

/// The reconstruction-and-analysis pipeline for one drawing set.
///
/// Holds only immutable inputs (catalog, config); every page run is a pure
/// function of its arguments, so one `Pipeline` may serve many pages.
#[derive(Debug, Clone)]
pub struct Pipeline {
    catalog: SymbolCatalog,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(catalog: SymbolCatalog, config: PipelineConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the full pipeline over one page, disciplines in sequence.
    pub fn analyze_page(
        &self,
        page: &PageInput,
        ground: GroundElevationFn<'_>,
    ) -> Result<PageAnalysis> {
        let (scale, world) = self.prepare(page);
        let mut networks = Vec::with_capacity(Discipline::ALL.len());
        let mut violations = self.page_violations(page, &scale, &world);
        for discipline in Discipline::ALL {
            let (net, mut v) = self.analyze_discipline(discipline, &world, &page.texts, &scale, ground)?;
            networks.push(net);
            violations.append(&mut v);
        }
        Ok(PageAnalysis {
            scale,
            networks,
            violations,
        })
    }

    /// As [`analyze_page`](Self::analyze_page), with one scoped thread per
    /// discipline. Output is identical to the sequential run.
    pub fn analyze_page_parallel(
        &self,
        page: &PageInput,
        ground: GroundElevationFn<'_>,
    ) -> Result<PageAnalysis> {
        let (scale, world) = self.prepare(page);
        let mut violations = self.page_violations(page, &scale, &world);

        let results = std::thread::scope(|s| {
            let handles: Vec<_> = Discipline::ALL
                .into_iter()
                .map(|d| {
                    let (scale, world, texts) = (&scale, &world, &page.texts);
                    s.spawn(move || self.analyze_discipline(d, world, texts, scale, ground))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut networks = Vec::with_capacity(results.len());
        for (net, mut v) in results {
            networks.push(net);
            violations.append(&mut v);
        }
        Ok(PageAnalysis {
            scale,
            networks,
            violations,
        })
    }

    /// Resolves the page scale once and lifts every primitive into world
    /// feet. Per-element rescaling is forbidden by contract; a stray text
    /// match must not desynchronize coordinates mid-page.
    fn prepare(&self, page: &PageInput) -> (ScaleTransform, Vec<VectorPrimitive>) {
        let scale = scale::resolve_scale(&page.texts, &page.primitives, &self.config.scale);
        let world = page
            .primitives
            .iter()
            .map(|p| p.map_points(|pt| scale.apply(pt)))
            .collect();
        (scale, world)
    }

    /// Page-level checks that belong to no single discipline.
    fn page_violations(
        &self,
        page: &PageInput,
        scale: &ScaleTransform,
        world: &[VectorPrimitive],
    ) -> Vec<QAViolation> {
        let mut out = Vec::new();
        if !scale.is_calibrated() {
            out.push(QAViolation {
                rule: "scale-unknown".into(),
                severity: Severity::Info,
                message: "no scale note or bar found; measurements are uncalibrated (1 unit = 1 ft)"
                    .into(),
                location: None,
                subject: None,
                details: Default::default(),
            });
        }
        out.extend(qa::check_ada(world, scale.feet_per_unit(), &self.config.qa));
        if let Some(sched) = &page.earthwork {
            out.extend(qa::check_schedule(&sched.measured, &sched.table, &self.config.qa));
        }
        out
    }

    fn analyze_discipline(
        &self,
        discipline: Discipline,
        world: &[VectorPrimitive],
        texts: &[TextToken],
        scale: &ScaleTransform,
        ground: GroundElevationFn<'_>,
    ) -> Result<(Network, Vec<QAViolation>)> {
        let mut net = graph::build_network(
            discipline,
            world,
            &self.catalog,
            &self.config.graph,
            &self.config.matching,
        );

        for node in &mut net.nodes {
            label::attach_node_labels(node, texts, scale, Some(&self.catalog), &self.config.labels);
        }
        for edge in &mut net.edges {
            label::attach_edge_labels(edge, texts, scale, &self.config.labels);
        }

        // Depth runs off node inverts; an edge with unlabeled endpoints gets
        // the quiet zero summary. Inverts are indexed once, not re-scanned
        // per endpoint.
        let inverts: FxHashMap<String, f64> = net
            .nodes
            .iter()
            .filter_map(|n| {
                n.attrs
                    .get("invert_elev_ft")
                    .and_then(AttrValue::as_number)
                    .map(|v| (n.id.clone(), v))
            })
            .collect();
        for i in 0..net.edges.len() {
            let edge = &net.edges[i];
            let profile = invert_profile(&inverts, edge);
            let summary = depth::analyze_depth(
                &profile,
                &|station| ground(edge, station),
                edge.material.as_deref(),
                edge.diameter_in.unwrap_or(0.0),
                discipline,
                edge.length_ft(),
                &self.config.depth,
            )?;
            net.edges[i]
                .attrs
                .insert("depth".into(), AttrValue::Depth(summary));
        }

        net.validate()?;
        let violations = qa::validate_network(&net, &self.config.qa, &self.config.depth);
        info!(
            %discipline,
            nodes = net.nodes.len(),
            edges = net.edges.len(),
            violations = violations.len(),
            "discipline analyzed"
        );
        Ok((net, violations))
    }
}

/// Invert profile for an edge, read from `invert_elev_ft` labels on its
/// resolved endpoints. One labeled end gives a flat profile; none gives an
/// empty one.
fn invert_profile(inverts: &FxHashMap<String, f64>, edge: &Edge) -> Vec<(f64, f64)> {
    let invert_at = |id: &Option<String>| id.as_deref().and_then(|id| inverts.get(id)).copied();
    match (invert_at(&edge.from), invert_at(&edge.to)) {
        (Some(a), Some(b)) => vec![(0.0, a), (1.0, b)],
        (Some(a), None) => vec![(0.0, a)],
        (None, Some(b)) => vec![(1.0, b)],
        (None, None) => Vec::new(),
    }
}
