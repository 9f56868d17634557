//! # Platform Collaborators
//!
//! Narrow interfaces to the services this backend depends on but does not
//! own: blob/file storage and the process-wide external configuration store
//! consumed by the mail/SMS/payment integrations. Components receive these
//! as injected trait objects.

pub mod blob;
pub mod env_store;

pub use blob::{BlobStore, FsBlobStore};
pub use env_store::{EnvFileStore, ExternalConfigStore};
