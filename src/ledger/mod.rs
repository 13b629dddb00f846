//! Season ledger
//!
//! Resolves submitted participants, rates the game and records it together
//! with every player write. Also hosts the season, player and game lookups.

pub mod recorder;
pub mod resolution;
pub mod service;

pub use recorder::GameRecorder;
pub use resolution::{PlayerResolver, ResolvedParticipant};
pub use service::LedgerService;
