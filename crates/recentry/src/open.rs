//! The seam AutoEntryEngine calls into TradeManager through.
//!
//! Unlike `recats::close::TradeCloser`, this isn't forced by a dependency
//! cycle — `recentry` could depend on `rectrade` directly. The trait is
//! kept anyway, mirroring `recats`'s shape: it keeps `recentry` testable
//! without a live TradeManager, and each passing candidate is delivered
//! with a plain direct call rather than a queue, since entries carry none
//! of close intents' at-most-one-per-trade ordering constraint.

use async_trait::async_trait;
use reccore::EntryIntent;

/// Implemented by TradeManager (in `rectrade`) and wired into the engine
/// at process startup.
#[async_trait]
pub trait EntryOpener: Send + Sync {
    async fn open_trade(&self, intent: EntryIntent) -> Result<(), String>;
}
