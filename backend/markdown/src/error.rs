use thiserror::Error;

/// Failures inside the formatting pipeline.
///
/// These never reach the renderer as errors: the pipeline turns them into
/// [`crate::Normalized::Fallback`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("input of {len} bytes exceeds the {limit} byte formatting limit")]
    InputTooLarge { len: usize, limit: usize },

    #[error("fence repair left {count} fence lines")]
    UnbalancedFences { count: usize },

    #[error("formatting did not settle after {rounds} rounds")]
    Unstable { rounds: usize },
}
