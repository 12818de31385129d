pub type Result<T> = std::result::Result<T, Error>;

/// Caller-contract violations.
///
/// Recognition and parsing ambiguity (no scale text, unmatched symbols,
/// malformed labels, empty profiles) never surfaces here; those resolve to
/// documented defaults and, where they concern data quality, to
/// [`QAViolation`](crate::qa::QAViolation)s.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network `{network}` has an edge with a missing endpoint: {edge_id} -> {node_id}")]
    MissingEndpoint {
        network: String,
        edge_id: String,
        node_id: String,
    },

    #[error("edge `{edge_id}` has a degenerate polyline ({points} point(s); at least 2 required)")]
    DegeneratePolyline { edge_id: String, points: usize },

    #[error("depth sample count must be at least 1")]
    InvalidSampleCount,
}
