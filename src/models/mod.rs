/// # Validation Outcome
///
/// Typed verdict produced by every validation stage and returned by the
/// composite pipeline.
///
/// ## Example JSON
/// ```json
/// {
///   "email": "user@example.invalidtld123",
///   "status": "invalid_tld",
///   "reason": "Unrecognized top-level domain: INVALIDTLD123"
/// }
/// ```
pub mod validation;

/// # Cluster Health
///
/// Per-node liveness map of the cache cluster and its quorum verdict.
///
/// ## Example JSON
/// ```json
/// {
///   "nodes": {
///     "redis://10.0.0.1:7000": "connected",
///     "redis://10.0.0.2:7000": "error: timed out after 2000ms"
///   },
///   "required_quorum": 1,
///   "checked_at": "2024-03-10T15:30:45.123456789Z"
/// }
/// ```
pub mod health;

pub use health::{ClusterStatus, NodeStatus};
pub use validation::{ValidationResult, ValidationStatus};
