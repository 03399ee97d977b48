//! The solver's failure surface and the compiler-stage context wrapper around it.

use thiserror::Error;

/// Errors the constraint solver can report while adding a constraint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("duplicate constraint")]
    DuplicateConstraint,

    #[error("unsatisfiable constraint")]
    UnsatisfiableConstraint,

    #[error("unknown constraint")]
    UnknownConstraint,

    #[error("duplicate edit variable")]
    DuplicateEditVariable,

    #[error("unknown edit variable")]
    UnknownEditVariable,

    #[error("required strength given where a soft strength was expected")]
    BadRequiredStrength,

    #[error("internal solver error: {0}")]
    Internal(String),
}

/// A [`SolverError`] with the layout-compiler stage that produced it.
///
/// `Layout::split` treats any `LayoutError` as a compiler bug, since every constraint the
/// compiler emits is constructed to be satisfiable; callers that want the `Result` instead of a
/// panic can use `Layout::try_split`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage}: {source}")]
pub struct LayoutError {
    pub stage: &'static str,
    #[source]
    pub source: SolverError,
}

impl LayoutError {
    pub(crate) fn new(stage: &'static str, source: SolverError) -> Self {
        Self { stage, source }
    }
}

pub(crate) trait StageContext<T> {
    fn stage(self, stage: &'static str) -> Result<T, LayoutError>;
}

impl<T> StageContext<T> for Result<T, SolverError> {
    fn stage(self, stage: &'static str) -> Result<T, LayoutError> {
        self.map_err(|e| LayoutError::new(stage, e))
    }
}
