use ulid::Ulid;

use crate::model::BookingStatus;

#[derive(Debug)]
pub enum EngineError {
    /// Malformed day/time/date/field input. Reported immediately; no retry.
    Validation(&'static str),
    /// Unknown inspector, booking, blackout, or public token.
    NotFound(Option<Ulid>),
    AlreadyExists(Ulid),
    /// Conflict detected at commit, or a public request outside
    /// published availability. Never auto-resolved by re-slotting —
    /// the caller must re-query slots and resubmit.
    SlotUnavailable(Option<Ulid>),
    OutsideAdvanceWindow,
    WidgetDisabled,
    /// Caller lacks rights (public channel attempting a mutation).
    Forbidden,
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    LimitExceeded(&'static str),
    /// Storage failure. Retryable by the caller; the engine itself
    /// never retries a booking commit.
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "validation: {msg}"),
            EngineError::NotFound(Some(id)) => write!(f, "not found: {id}"),
            EngineError::NotFound(None) => write!(f, "not found"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::SlotUnavailable(Some(id)) => {
                write!(f, "slot unavailable: conflicts with booking {id}")
            }
            EngineError::SlotUnavailable(None) => write!(f, "slot unavailable"),
            EngineError::OutsideAdvanceWindow => {
                write!(f, "requested slot is outside the advance booking window")
            }
            EngineError::WidgetDisabled => {
                write!(f, "public booking widget is disabled for this inspector")
            }
            EngineError::Forbidden => write!(f, "forbidden"),
            EngineError::InvalidTransition { from, to } => {
                write!(
                    f,
                    "invalid status transition: {} -> {}",
                    from.as_str(),
                    to.as_str()
                )
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
