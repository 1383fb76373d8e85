use thiserror::Error;

/// Errors surfaced by curve construction and evaluation.
///
/// `DegenerateGeometry` is not a programming error: it reports a legitimate
/// geometric singularity (a cusp or a locally straight curve) that the caller
/// must decide how to handle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    #[error("invalid curve definition: {0}")]
    InvalidCurveDefinition(String),

    #[error("parameter {parameter} is outside the evaluation domain [{min}, {max}]")]
    DomainError {
        parameter: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),
}
