mod cursor;
mod faults;
mod store;

pub use cursor::MemoryFeedCursor;
pub use faults::FaultPlan;
pub use store::MemoryStore;
