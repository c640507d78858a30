//! Error taxonomy for the topology compiler and query engine.

use thiserror::Error;

/// Errors raised while parsing a single `name[slice]` endpoint segment.
///
/// Resolving whether `name` actually exists in scope is the caller's job
/// (spec: "`UnknownNameError` ... resolved by the caller, not the parser").
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SliceError {
    /// The slice expression could not be parsed at all.
    #[error("malformed slice expression {expr:?} in segment {segment:?}")]
    Malformed {
        /// The full `name[slice]` segment this error was found in.
        segment: String,
        /// The `[...]` contents that failed to parse.
        expr: String,
    },
    /// `step` was present and less than 1.
    #[error("slice step must be >= 1 in segment {segment:?}, got {step}")]
    NonPositiveStep {
        /// The full `name[slice]` segment this error was found in.
        segment: String,
        /// The offending step value.
        step: i64,
    },
    /// `start >= count` or `stop > count` for the resolved component count.
    #[error("slice {start}:{stop} out of range for {name:?} (count={count})")]
    OutOfRange {
        /// The component name the slice was resolved against.
        name: String,
        /// Resolved start index.
        start: u32,
        /// Resolved stop index.
        stop: u32,
        /// The component's declared replication count.
        count: u32,
    },
    /// `start > stop` after defaults were applied.
    #[error("slice start {start} is greater than stop {stop} in segment {segment:?}")]
    StartAfterStop {
        /// The full `name[slice]` segment this error was found in.
        segment: String,
        /// Resolved start index.
        start: u32,
        /// Resolved stop index.
        stop: u32,
    },
}

/// The complete error taxonomy for the topology compiler's public operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The input declaration failed to parse upstream of the core (an
    /// external collaborator's concern; reported as-is).
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A slice expression was unparseable or had a non-positive step.
    #[error("malformed slice: {0}")]
    MalformedSlice(String),

    /// A component/device/instance/link name did not resolve in scope.
    #[error("unknown name {name:?}: {reason}")]
    UnknownName {
        /// The name that failed to resolve.
        name: String,
        /// One-sentence explanation of where it was looked up.
        reason: String,
    },

    /// A structural invariant over the declaration or assembled graph was
    /// violated (duplicate names, cyclic device composition, dangling
    /// link, cross-instance device edge, self-loop at assembly, mismatched
    /// ONE2ONE cardinalities, ...).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A query or annotation referenced a node id not present in the
    /// compiled graph.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// `shortest_path` found no route between two connected endpoints.
    #[error("no path between {src:?} and {dst:?}")]
    NoPath {
        /// The requested source node id.
        src: String,
        /// The requested destination node id.
        dst: String,
    },

    /// A query/annotate/shortest-path/get_graph operation was attempted
    /// before the first successful `set_graph`.
    #[error("topology service has no compiled graph yet; call set_graph first")]
    NotInitialized,

    /// A `query_graph` filter's `REGEX` value was not a valid regular
    /// expression. Spec.md's service surface lists `UnknownFilterKind` for
    /// `query_graph`, a failure mode for a dynamically-typed filter kind
    /// field; this crate's `Filter` is a Rust enum, so an unknown *kind* is
    /// structurally impossible, and this variant takes its place for the
    /// one way a well-typed filter can still be malformed.
    #[error("invalid regex pattern {pattern:?}: {reason}")]
    InvalidFilter {
        /// The offending pattern text.
        pattern: String,
        /// The regex engine's error message.
        reason: String,
    },
}

impl From<SliceError> for TopologyError {
    fn from(err: SliceError) -> Self {
        Self::MalformedSlice(err.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TopologyError>;
