use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::LinkStore;
use crate::error::LinkStoreResult;
use crate::model::Link;

/// Mirrored mutation surface over a remote [`LinkStore`].
///
/// The mirror is the single owned link collection the engine reads from; it
/// changes only through the operations below, and only after the remote call
/// succeeds. Any remote failure is surfaced to the caller with the mirror
/// left exactly as it was.
pub struct LinkRepository {
    store: Arc<dyn LinkStore>,
    links: Vec<Link>,
}

impl LinkRepository {
    /// Create a repository with an empty mirror.
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self {
            store,
            links: Vec::new(),
        }
    }

    /// Create a repository seeded with an initial mirror snapshot.
    pub fn with_links(store: Arc<dyn LinkStore>, links: Vec<Link>) -> Self {
        Self { store, links }
    }

    /// Current mirror contents.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Replace the mirror with the union of links touching the given message
    /// ids, deduplicated by link id. Returns the new mirror size.
    ///
    /// Two lookups because the store may not index an OR across the source
    /// and target columns.
    pub async fn fetch_links_for_messages(&mut self, ids: &[String]) -> LinkStoreResult<usize> {
        let from_sources = self.store.links_from_sources(ids).await?;
        let to_targets = self.store.links_to_targets(ids).await?;

        let mut seen = HashSet::new();
        let mut merged = Vec::with_capacity(from_sources.len() + to_targets.len());
        for link in from_sources.into_iter().chain(to_targets) {
            if seen.insert(link.id.clone()) {
                merged.push(link);
            }
        }

        debug!(links = merged.len(), "Refreshed link mirror from store");
        self.links = merged;
        Ok(self.links.len())
    }

    /// Persist one link remotely, then mirror it.
    pub async fn create(&mut self, link: Link) -> LinkStoreResult<Link> {
        let created = self.store.create_link(&link).await?;
        self.links.push(created.clone());
        info!(link_id = %created.id, kind = %created.kind, "Link created");
        Ok(created)
    }

    /// Persist several links atomically, then mirror them all.
    ///
    /// Remote failure of any item fails the whole batch and mirrors nothing.
    pub async fn create_batch(&mut self, links: Vec<Link>) -> LinkStoreResult<Vec<Link>> {
        let created = self.store.create_links(&links).await?;
        self.links.extend(created.iter().cloned());
        info!(count = created.len(), "Link batch created");
        Ok(created)
    }

    /// Update one link's weight remotely, then patch the mirror entry.
    pub async fn update_weight(&mut self, link_id: &str, weight: f64) -> LinkStoreResult<Link> {
        let updated = self.store.update_weight(link_id, weight).await?;
        if let Some(existing) = self.links.iter_mut().find(|l| l.id == link_id) {
            *existing = updated.clone();
        }
        info!(link_id, weight, "Link weight updated");
        Ok(updated)
    }

    /// Delete one link remotely, then drop it from the mirror.
    pub async fn delete(&mut self, link_id: &str) -> LinkStoreResult<()> {
        self.store.delete_link(link_id).await?;
        self.links.retain(|l| l.id != link_id);
        info!(link_id, "Link deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkStoreError;
    use crate::links::MockLinkStore;
    use crate::model::LinkKind;

    fn eval_link(id: &str, weight: f64) -> Link {
        let mut link = Link::new("src", "tgt", LinkKind::Evaluation).with_weight(weight);
        link.id = id.to_string();
        link
    }

    fn store_error() -> LinkStoreError {
        LinkStoreError::Api {
            status: 500,
            message: "boom".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_mirrors_on_success() {
        let mut store = MockLinkStore::new();
        store
            .expect_create_link()
            .returning(|link| Ok(link.clone()));

        let mut repo = LinkRepository::new(Arc::new(store));
        let created = repo
            .create(Link::new("a", "b", LinkKind::Reply))
            .await
            .unwrap();
        assert_eq!(repo.links().len(), 1);
        assert_eq!(repo.links()[0].id, created.id);
    }

    #[tokio::test]
    async fn test_create_failure_leaves_mirror_untouched() {
        let mut store = MockLinkStore::new();
        store
            .expect_create_link()
            .returning(|_| Err(store_error()));

        let mut repo = LinkRepository::new(Arc::new(store));
        let result = repo.create(Link::new("a", "b", LinkKind::Reply)).await;
        assert!(result.is_err());
        assert!(repo.links().is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_mirrors_zero_items() {
        // Store rejects the batch (e.g. item 2 of 3 failed remotely): the
        // whole batch is treated as failed and nothing lands in the mirror.
        let mut store = MockLinkStore::new();
        store
            .expect_create_links()
            .returning(|_| Err(store_error()));

        let mut repo = LinkRepository::new(Arc::new(store));
        let batch = vec![
            Link::new("a", "b", LinkKind::Evaluation).with_weight(1.0),
            Link::new("c", "d", LinkKind::Evaluation).with_weight(2.0),
            Link::new("e", "f", LinkKind::Evaluation).with_weight(3.0),
        ];
        let result = repo.create_batch(batch).await;
        assert!(result.is_err());
        assert!(repo.links().is_empty());
    }

    #[tokio::test]
    async fn test_batch_success_mirrors_all_items() {
        let mut store = MockLinkStore::new();
        store
            .expect_create_links()
            .returning(|links| Ok(links.to_vec()));

        let mut repo = LinkRepository::new(Arc::new(store));
        let batch = vec![
            Link::new("a", "b", LinkKind::Reply),
            Link::new("c", "d", LinkKind::Critique),
        ];
        let created = repo.create_batch(batch).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(repo.links().len(), 2);
    }

    #[tokio::test]
    async fn test_update_weight_patches_mirror() {
        let mut store = MockLinkStore::new();
        store
            .expect_update_weight()
            .returning(|id, weight| Ok(eval_link(id, weight)));

        let seed = eval_link("l-1", 2.0);
        let mut repo = LinkRepository::with_links(Arc::new(store), vec![seed]);
        repo.update_weight("l-1", 9.0).await.unwrap();
        assert_eq!(repo.links()[0].weight, Some(9.0));
    }

    #[tokio::test]
    async fn test_update_weight_failure_leaves_mirror_untouched() {
        let mut store = MockLinkStore::new();
        store
            .expect_update_weight()
            .returning(|_, _| Err(store_error()));

        let seed = eval_link("l-1", 2.0);
        let mut repo = LinkRepository::with_links(Arc::new(store), vec![seed]);
        assert!(repo.update_weight("l-1", 9.0).await.is_err());
        assert_eq!(repo.links()[0].weight, Some(2.0));
    }

    #[tokio::test]
    async fn test_delete_drops_mirror_entry() {
        let mut store = MockLinkStore::new();
        store.expect_delete_link().returning(|_| Ok(()));

        let mut repo =
            LinkRepository::with_links(Arc::new(store), vec![eval_link("l-1", 1.0)]);
        repo.delete("l-1").await.unwrap();
        assert!(repo.links().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_mirror_entry() {
        let mut store = MockLinkStore::new();
        store.expect_delete_link().returning(|_| {
            Err(LinkStoreError::LinkNotFound {
                link_id: "l-1".to_string(),
            })
        });

        let mut repo =
            LinkRepository::with_links(Arc::new(store), vec![eval_link("l-1", 1.0)]);
        assert!(repo.delete("l-1").await.is_err());
        assert_eq!(repo.links().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_unions_and_deduplicates() {
        let shared = eval_link("l-shared", 5.0);
        let from_only = eval_link("l-from", 1.0);
        let to_only = eval_link("l-to", 2.0);

        let mut store = MockLinkStore::new();
        {
            let shared = shared.clone();
            let from_only = from_only.clone();
            store
                .expect_links_from_sources()
                .returning(move |_| Ok(vec![from_only.clone(), shared.clone()]));
        }
        {
            let shared = shared.clone();
            let to_only = to_only.clone();
            store
                .expect_links_to_targets()
                .returning(move |_| Ok(vec![shared.clone(), to_only.clone()]));
        }

        let mut repo = LinkRepository::new(Arc::new(store));
        let count = repo
            .fetch_links_for_messages(&["src".to_string(), "tgt".to_string()])
            .await
            .unwrap();
        assert_eq!(count, 3);
        let ids: Vec<&str> = repo.links().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["l-from", "l-shared", "l-to"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_mirror() {
        let mut store = MockLinkStore::new();
        store
            .expect_links_from_sources()
            .returning(|_| Err(store_error()));

        let seed = eval_link("l-1", 1.0);
        let mut repo = LinkRepository::with_links(Arc::new(store), vec![seed]);
        assert!(repo
            .fetch_links_for_messages(&["src".to_string()])
            .await
            .is_err());
        assert_eq!(repo.links().len(), 1);
    }
}
