//! Stable, machine-readable error codes for structured logging.

/// Implemented by every error enum in the workspace so callers can log
/// `error.error_code()` instead of matching on display text.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const INVALID_WEIGHT: &str = "GROUNDING_INVALID_WEIGHT";
pub const IDENTITY_OUT_OF_RANGE: &str = "GROUNDING_IDENTITY_OUT_OF_RANGE";
pub const INVALID_ARITY: &str = "GROUNDING_INVALID_ARITY";
pub const CONFLICTING_EVIDENCE: &str = "GROUNDING_CONFLICTING_EVIDENCE";
pub const CONTRADICTORY_HARD_CONSTRAINTS: &str = "GROUNDING_CONTRADICTORY_HARD_CONSTRAINTS";
pub const UNSUPPORTED_DYNAMIC: &str = "GROUNDING_UNSUPPORTED_DYNAMIC";
pub const EMPTY_MRF: &str = "GROUNDING_EMPTY_MRF";
