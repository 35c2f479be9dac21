use thiserror::Error;
use weft_types::TypeError;

/// Failures of registry construction and resolution.
///
/// All of these are configuration or programming errors: they are surfaced
/// once and propagated, never retried, and a failed resolution never falls
/// back to a best-effort guess.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// A bean's class hierarchy is structurally broken (unbound type
    /// parameter, wrong arity). Fatal at registry construction.
    #[error("invalid bean hierarchy: {0}")]
    InvalidHierarchy(#[from] TypeError),

    /// A producer's signature is inconsistent with its own declarations.
    /// Fatal at registry construction; the bean is never silently dropped.
    #[error("invalid producer signature on bean `{bean}`: {detail}")]
    InvalidProducerSignature { bean: String, detail: String },

    /// No candidate matched the injection point.
    #[error("unsatisfied dependency: no bean provides `{required}` (tags: {tags:?})")]
    Unsatisfied { required: String, tags: Vec<String> },

    /// More than one candidate survived disambiguation.
    #[error("ambiguous dependency: `{required}` is provided by {candidates:?}")]
    Ambiguous {
        required: String,
        candidates: Vec<String>,
    },
}
