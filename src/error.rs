//! Error taxonomy for the tag engine's operation surface.

use thiserror::Error;

/// Every error the four operations (`open`, `receive`, `send`, `control`)
/// can return. Errors are surfaced verbatim to the caller; the engine never
/// retries internally.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TagError {
    /// Argument class: caller passed an invalid slot, level, key, or
    /// command/permission combination.
    #[error("invalid argument")]
    Invalid,
    /// Resource class: the descriptor namespace is exhausted.
    #[error("descriptor namespace exhausted")]
    NoSpace,
    /// Resource class: allocation of instance storage failed.
    #[error("allocation failed")]
    NoMem,
    /// Resource class: caller-supplied buffer is too small for the pending
    /// message.
    #[error("caller buffer too small")]
    NoBuffer,
    /// Presence class: `open(OPEN, ...)` found no instance under that key.
    #[error("no instance registered under that key")]
    NoKey,
    /// Presence class: the slot exists but its instance has been removed.
    #[error("slot present but instance retired")]
    Gone,
    /// Access class: caller is neither the creator nor root, and the
    /// instance requires a permission check.
    #[error("permission denied")]
    Denied,
    /// Contention class: `control(REMOVE)` found a receiver still
    /// registered.
    #[error("operation would block on a busy instance")]
    Busy,
    /// Contention class: `open(CREATE, ...)` found the key already in use.
    #[error("key already in use")]
    Already,
    /// Asynchrony class: a blocking wait was interrupted via the caller's
    /// cancellation token before it could complete.
    #[error("interrupted")]
    Intr,
    /// Asynchrony class: `receive` was cancelled by a concurrent
    /// `control(AWAKE_ALL)`.
    #[error("cancelled by awake-all")]
    Canceled,
    /// Fault class: the data copy into or out of the caller's buffer could
    /// not complete.
    #[error("unrecoverable data copy failure")]
    Fault,
}
