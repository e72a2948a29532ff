pub mod ranked;

pub use ranked::{RankedEntry, ranked_entries};
