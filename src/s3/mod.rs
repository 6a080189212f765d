pub mod client;
pub mod memory;
pub mod metrics;
pub mod store;

pub use client::S3Client;
pub use memory::MemoryStore;
pub use metrics::TransferMetrics;
pub use store::{ObjectBody, ObjectPage, ObjectStore, StoreError};
