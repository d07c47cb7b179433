//! # keepsake-store
//!
//! Storage layer for the Keepsake wedding-album server.
//!
//! Media metadata lives in an in-memory registry that owns id assignment
//! and the id-to-record map; raw bytes live on disk in a [`BlobStore`]
//! directory that only the registry writes to.  Metadata is not persisted
//! across restarts: blobs survive a restart, records do not.

pub mod blob_store;
pub mod media;
pub mod models;
pub mod users;

mod error;

pub use blob_store::BlobStore;
pub use error::StoreError;
pub use media::{MediaRegistry, NewMedia};
pub use models::*;
pub use users::UserRegistry;
