//! # Punnyland
//!
//! Runtime side of Punnyland: picks jokes from the curated dataset and keeps
//! the listener's profile (history, favorites, achievements).
//!
//! The dataset is read-only here; curation lives in `punnyland-curate`.

pub mod delivery;
pub mod lines;
pub mod profile;

pub use delivery::{DeckStats, JokeDeck, JokePackage};
pub use profile::UserProfile;
