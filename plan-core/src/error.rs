/// Errors surfaced by the planning library.
///
/// `InvalidCatalog` and `InvalidArgument` are caller errors and are raised
/// before any search work starts. `NoSolution` is a legitimate outcome: the
/// mandatory coverage constraint was never satisfied within the explored
/// beam, or a multi-block sub-solve came up empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no feasible block layout")]
    NoSolution,
}
