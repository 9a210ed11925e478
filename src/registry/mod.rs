// src/registry/mod.rs

//! Component registry
//!
//! - [`index`]: the `index.json` document
//! - [`store`]: the on-disk registry layout, publishing and verification
//! - [`source`]: the [`RegistrySource`] trait and the local directory source
//! - [`client`]: the HTTP source

pub mod client;
pub mod index;
pub mod source;
pub mod store;

pub use client::{looks_like_html, HttpRegistry};
pub use index::{IndexEntry, RegistryIndex, INDEX_FILE_NAME};
pub use source::{open_registry, verify_archive, LocalRegistry, RegistrySource};
pub use store::{
    diff_immutable, Finding, Health, ImmutableChange, PublishOutcome, RegistryStore, Severity,
    VerifyReport, HEADERS_FILE_NAME, HEALTH_FILE_NAME, IMMUTABLE_CACHE_CONTROL,
    INDEX_CACHE_CONTROL, PUBLIC_KEY_FILE_NAME,
};

/// Registry used when the state file names none
pub const DEFAULT_REGISTRY: &str = "https://registry.wpsyde.com";
