//! In-process cache tiers for rendered feeds.

mod ephemeral;

pub use ephemeral::EphemeralCache;
