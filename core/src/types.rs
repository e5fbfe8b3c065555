//! Shared primitive types used across the orchestration layer.

/// A request sequence token. Tokens are issued in strictly increasing
/// order per orchestrator; the highest issued token is authoritative.
pub type Token = u64;

/// A stable parameter name, as it appears in the request body.
pub type ParamKey = String;

/// The canonical scenario variant identifier ("business_impact", ...).
pub type VariantId = String;
