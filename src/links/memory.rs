use std::sync::Mutex;

use async_trait::async_trait;

use super::LinkStore;
use crate::error::{LinkStoreError, LinkStoreResult};
use crate::model::Link;

/// In-process [`LinkStore`] for embedding and tests.
///
/// Behaves like the remote contract: batch creation is all-or-nothing and
/// weight updates on unknown ids fail with [`LinkStoreError::LinkNotFound`].
#[derive(Debug, Default)]
pub struct InMemoryLinkStore {
    links: Mutex<Vec<Link>>,
}

impl InMemoryLinkStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with links.
    pub fn seeded(links: Vec<Link>) -> Self {
        Self {
            links: Mutex::new(links),
        }
    }

    /// Copy of the current store contents.
    pub fn snapshot(&self) -> Vec<Link> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Link>> {
        self.links.lock().expect("link store lock poisoned")
    }
}

#[async_trait]
impl LinkStore for InMemoryLinkStore {
    async fn links_from_sources(&self, ids: &[String]) -> LinkStoreResult<Vec<Link>> {
        Ok(self
            .lock()
            .iter()
            .filter(|l| ids.contains(&l.source_message_id))
            .cloned()
            .collect())
    }

    async fn links_to_targets(&self, ids: &[String]) -> LinkStoreResult<Vec<Link>> {
        Ok(self
            .lock()
            .iter()
            .filter(|l| ids.contains(&l.target_message_id))
            .cloned()
            .collect())
    }

    async fn create_link(&self, link: &Link) -> LinkStoreResult<Link> {
        self.lock().push(link.clone());
        Ok(link.clone())
    }

    async fn create_links(&self, links: &[Link]) -> LinkStoreResult<Vec<Link>> {
        // Single extend under one lock: the batch lands whole or not at all.
        self.lock().extend_from_slice(links);
        Ok(links.to_vec())
    }

    async fn update_weight(&self, link_id: &str, weight: f64) -> LinkStoreResult<Link> {
        let mut links = self.lock();
        match links.iter_mut().find(|l| l.id == link_id) {
            Some(link) => {
                link.weight = Some(weight);
                Ok(link.clone())
            }
            None => Err(LinkStoreError::LinkNotFound {
                link_id: link_id.to_string(),
            }),
        }
    }

    async fn delete_link(&self, link_id: &str) -> LinkStoreResult<()> {
        let mut links = self.lock();
        let before = links.len();
        links.retain(|l| l.id != link_id);
        if links.len() == before {
            return Err(LinkStoreError::LinkNotFound {
                link_id: link_id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinkKind;

    #[tokio::test]
    async fn test_lookups_filter_by_direction() {
        let link = Link::new("src-1", "tgt-1", LinkKind::Reply);
        let store = InMemoryLinkStore::seeded(vec![link.clone()]);

        let from = store
            .links_from_sources(&["src-1".to_string()])
            .await
            .unwrap();
        assert_eq!(from.len(), 1);

        let to = store
            .links_to_targets(&["src-1".to_string()])
            .await
            .unwrap();
        assert!(to.is_empty());
    }

    #[tokio::test]
    async fn test_update_weight_unknown_id_fails() {
        let store = InMemoryLinkStore::new();
        let err = store.update_weight("missing", 1.0).await.unwrap_err();
        assert!(matches!(err, LinkStoreError::LinkNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails() {
        let store = InMemoryLinkStore::new();
        let err = store.delete_link("missing").await.unwrap_err();
        assert!(matches!(err, LinkStoreError::LinkNotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_and_snapshot() {
        let store = InMemoryLinkStore::new();
        store
            .create_link(&Link::new("a", "b", LinkKind::Critique))
            .await
            .unwrap();
        assert_eq!(store.snapshot().len(), 1);
    }
}
