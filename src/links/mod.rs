//! Link repository surface.
//!
//! The engine never talks to the link store directly: every mutation goes
//! through [`LinkRepository`], which owns the in-memory mirror the read side
//! is computed from. The remote side is abstracted as the [`LinkStore`]
//! trait, with [`HttpLinkStore`] as the production client and
//! [`InMemoryLinkStore`] for embedding and tests.

mod http;
mod memory;
mod repository;

pub use http::HttpLinkStore;
pub use memory::InMemoryLinkStore;
pub use repository::LinkRepository;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::LinkStoreResult;
use crate::model::Link;

/// Remote link store contract.
///
/// Source and target lookups are split because the store may not support an
/// efficient OR across both columns; the repository unions and deduplicates.
/// Batch creation is atomic on the remote side: it persists every item or
/// none of them.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Links whose source message is one of `ids`.
    async fn links_from_sources(&self, ids: &[String]) -> LinkStoreResult<Vec<Link>>;

    /// Links whose target message is one of `ids`.
    async fn links_to_targets(&self, ids: &[String]) -> LinkStoreResult<Vec<Link>>;

    /// Persist one link, returning the stored record.
    async fn create_link(&self, link: &Link) -> LinkStoreResult<Link>;

    /// Persist several links atomically, returning the stored records.
    async fn create_links(&self, links: &[Link]) -> LinkStoreResult<Vec<Link>>;

    /// Update one link's weight, returning the updated record.
    async fn update_weight(&self, link_id: &str, weight: f64) -> LinkStoreResult<Link>;

    /// Delete one link.
    async fn delete_link(&self, link_id: &str) -> LinkStoreResult<()>;
}
