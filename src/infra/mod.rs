pub mod recognition;
pub mod store;

pub use recognition::{RecognitionClient, RecognitionError};
pub use store::{InventoryStore, JsonFileStore, MemoryStore, StoreError};
