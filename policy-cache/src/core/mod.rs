pub mod arena;
pub mod error;
pub mod list;
pub mod types;

pub use arena::{SlotArena, SlotId};
pub use error::{CacheError, EnqueueError, Result};
pub use list::OrderingList;
pub(crate) use types::StatsRecorder;
pub use types::{CachePolicy, CacheStats, Node};
