pub mod client;

pub use client::StorageApiClient;
