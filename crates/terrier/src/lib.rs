#![forbid(unsafe_code)]

//! `terrier` reconstructs storm, sanitary, and water networks from the
//! vector geometry and text of engineering drawings, then derives trench
//! depth/volume statistics and validates the result against engineering
//! rules.
//!
//! The heavy lifting lives in `terrier-core`; this crate is the public
//! surface. Ingestion (opening drawing files), symbol classification
//! (building the catalog), and ground-surface modeling are collaborators
//! the caller supplies.

pub use terrier_core::*;

/// Runs the pipeline over a sequence of pages, concatenating networks and
/// violations in page order. Pages are independent; callers wanting
/// page-level parallelism can fan out themselves and concatenate, which is
/// exactly what this helper does sequentially.
pub fn analyze_pages(
    pipeline: &Pipeline,
    pages: &[PageInput],
    ground: GroundElevationFn<'_>,
) -> Result<Vec<PageAnalysis>> {
    pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let analysis = pipeline.analyze_page(page, ground)?;
            tracing::debug!(
                page = i,
                networks = analysis.networks.len(),
                violations = analysis.violations.len(),
                "page analyzed"
            );
            Ok(analysis)
        })
        .collect()
}
