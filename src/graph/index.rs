use std::collections::HashMap;

use tracing::debug;

use crate::model::{Link, Message};

/// Lookup structures over one message/link snapshot.
///
/// Messages live in an arena keyed by id; tree structure is kept as id lists
/// so that nothing here holds references into the assembled trees. Rebuilt
/// from scratch whenever the snapshot changes.
#[derive(Debug, Default)]
pub struct GraphIndex {
    by_id: HashMap<String, Message>,
    children: HashMap<String, Vec<String>>,
    outgoing: HashMap<String, Vec<Link>>,
    incoming: HashMap<String, Vec<Link>>,
}

impl GraphIndex {
    /// Build the index from a full snapshot. Empty input yields empty maps.
    pub fn build(messages: &[Message], links: &[Link]) -> Self {
        let mut by_id = HashMap::with_capacity(messages.len());
        let mut grouped: HashMap<String, Vec<&Message>> = HashMap::new();

        for message in messages {
            by_id.insert(message.id.clone(), message.clone());
            if let Some(parent_id) = &message.parent_message_id {
                grouped.entry(parent_id.clone()).or_default().push(message);
            }
        }

        let children = grouped
            .into_iter()
            .map(|(parent_id, mut siblings)| {
                // Chronological order is the only sibling ordering contract;
                // stable sort keeps input order for equal timestamps.
                siblings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                let ids = siblings.into_iter().map(|m| m.id.clone()).collect();
                (parent_id, ids)
            })
            .collect();

        let mut outgoing: HashMap<String, Vec<Link>> = HashMap::new();
        let mut incoming: HashMap<String, Vec<Link>> = HashMap::new();
        for link in links {
            outgoing
                .entry(link.source_message_id.clone())
                .or_default()
                .push(link.clone());
            incoming
                .entry(link.target_message_id.clone())
                .or_default()
                .push(link.clone());
        }

        debug!(
            messages = messages.len(),
            links = links.len(),
            "Built graph index"
        );

        Self {
            by_id,
            children,
            outgoing,
            incoming,
        }
    }

    /// Look up a message by id.
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.by_id.get(id)
    }

    /// Child message ids of a parent, created_at-ascending.
    pub fn children_of(&self, parent_id: &str) -> &[String] {
        self.children
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Links whose source is the given message.
    pub fn outgoing(&self, id: &str) -> &[Link] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Links whose target is the given message.
    pub fn incoming(&self, id: &str) -> &[Link] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every link touching the given message, deduplicated by link id.
    ///
    /// A self-referencing link appears in both maps but is returned once.
    pub fn links_touching(&self, id: &str) -> Vec<Link> {
        let outgoing = self.outgoing(id);
        let mut touching = Vec::with_capacity(outgoing.len());
        touching.extend_from_slice(outgoing);
        for link in self.incoming(id) {
            if !touching.iter().any(|l| l.id == link.id) {
                touching.push(link.clone());
            }
        }
        touching
    }

    /// Number of messages in the arena.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
