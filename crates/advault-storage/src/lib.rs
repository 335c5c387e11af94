//! Advault Storage Library
//!
//! Blob storage for downloaded ad videos: the `Storage` trait plus local
//! filesystem and S3-compatible implementations.
//!
//! # Storage key format
//!
//! Keys are path-like strings such as `videos/{post_id}.mp4`. They must not
//! contain `..` or a leading `/`. Key helpers live in the `keys` module so all
//! backends and the HTTP layer agree on the layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use advault_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(any(test, feature = "test-helpers"))]
pub use memory::MockStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
