//! Results of store operations.

use std::fmt;

/// What happened to a cart or wishlist operation.
///
/// Remote failures never surface as errors; they are logged and reported
/// here so the UI layer can decide whether to show a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The backend accepted the change and the mirror reflects it.
    Confirmed,
    /// Nothing was attempted.
    Skipped(SkipReason),
    /// The backend rejected the change; the optimistic update was undone.
    RolledBack,
    /// The backend rejected a confirm-first change; the mirror was not touched.
    Failed,
    /// The session changed while the call was in flight; its result was dropped.
    Discarded,
}

impl MutationOutcome {
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

impl fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => f.write_str("confirmed"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::RolledBack => f.write_str("rolled back"),
            Self::Failed => f.write_str("failed"),
            Self::Discarded => f.write_str("discarded"),
        }
    }
}

/// Why an operation was skipped without a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotSignedIn,
    NotInCart,
    NotInWishlist,
    /// Cart quantity already matches the known stock.
    AtStockLimit,
    /// Quantity is already 1; only removal goes lower.
    AtMinimum,
    /// The line has no server id yet.
    AwaitingConfirmation,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotSignedIn => "not signed in",
            Self::NotInCart => "not in cart",
            Self::NotInWishlist => "not in wishlist",
            Self::AtStockLimit => "no more stock available",
            Self::AtMinimum => "quantity is already 1",
            Self::AwaitingConfirmation => "line not yet confirmed",
        })
    }
}
