mod pattern;
mod store;

pub use pattern::{Pattern, Snapshot, Tempo, Track};
pub use store::PatternStore;
