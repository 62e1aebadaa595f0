use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{group, score, CandidateNode, GraphIndex, RequestGroup};
use crate::error::AppResult;
use crate::links::LinkRepository;
use crate::model::{Link, Message};

/// Read facade and mutation pass-through over one conversational scope.
///
/// Owns the message snapshot and the link repository (whose mirror is the
/// single authoritative in-memory link list). Derived state is recomputed
/// synchronously whenever either input changes; reads are always served from
/// the last recompute and never fail. Only the repository's remote boundary
/// can error, and a failed mutation leaves every derived structure as it was.
pub struct CandidateGraph {
    messages: Vec<Message>,
    repository: LinkRepository,
    index: GraphIndex,
    groups: Vec<RequestGroup>,
}

/// Cheap derived summary of the assembled graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of request groups.
    pub groups: usize,
    /// Total materialized candidate nodes across all groups.
    pub nodes: usize,
    /// Links currently in the mirror.
    pub links: usize,
    /// Deepest node depth across all candidate trees.
    pub max_depth: usize,
}

impl CandidateGraph {
    /// Create the engine over a message snapshot and a link repository.
    ///
    /// The repository mirror is taken as-is; call [`refresh_links`] to pull
    /// the current link set from the remote store.
    ///
    /// [`refresh_links`]: CandidateGraph::refresh_links
    pub fn new(messages: Vec<Message>, repository: LinkRepository) -> Self {
        let mut engine = Self {
            messages,
            repository,
            index: GraphIndex::default(),
            groups: Vec::new(),
        };
        engine.recompute();
        engine
    }

    /// All request groups, in input order of their user messages.
    pub fn groups(&self) -> &[RequestGroup] {
        &self.groups
    }

    /// Root candidate nodes of one group. Unknown ids yield an empty slice.
    pub fn tree(&self, group_id: &str) -> &[CandidateNode] {
        self.groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.candidates.as_slice())
            .unwrap_or(&[])
    }

    /// Depth-first flatten of every candidate tree in every group.
    ///
    /// Parents always precede their children; groups and siblings keep their
    /// assembled order.
    pub fn flat_nodes(&self) -> Vec<&CandidateNode> {
        let mut flattened = Vec::new();
        for group in &self.groups {
            for candidate in &group.candidates {
                flatten_into(candidate, &mut flattened);
            }
        }
        flattened
    }

    /// Lineage from the root-most ancestor down to the given message.
    ///
    /// Walks parent pointers upward until a message has no parent, the parent
    /// is missing from the snapshot, or a cycle revisits an id; the collected
    /// chain is returned root-first. Unknown ids yield an empty path.
    pub fn path_to(&self, message_id: &str) -> Vec<Message> {
        let Some(mut current) = self.index.message(message_id) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        let mut path = Vec::new();
        loop {
            if !visited.insert(current.id.as_str()) {
                debug!(message_id, "Cycle while walking ancestry, truncating path");
                break;
            }
            path.push(current.clone());
            match current
                .parent_message_id
                .as_deref()
                .and_then(|id| self.index.message(id))
            {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Aggregate evaluation score over an arbitrary message path, using the
    /// engine's current link mirror. See [`score::path_score`].
    pub fn score_path(&self, path: &[Message]) -> Option<f64> {
        score::path_score(path, self.repository.links())
    }

    /// Current link mirror.
    pub fn links(&self) -> &[Link] {
        self.repository.links()
    }

    /// Summary counts over the assembled graph.
    pub fn stats(&self) -> GraphStats {
        let flattened = self.flat_nodes();
        GraphStats {
            groups: self.groups.len(),
            nodes: flattened.len(),
            links: self.repository.links().len(),
            max_depth: flattened.iter().map(|n| n.depth).max().unwrap_or(0),
        }
    }

    /// Replace the message snapshot and recompute.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.recompute();
    }

    /// Refresh the link mirror from the remote store for every message in
    /// the snapshot, then recompute. Returns the mirror size.
    pub async fn refresh_links(&mut self) -> AppResult<usize> {
        let ids: Vec<String> = self.messages.iter().map(|m| m.id.clone()).collect();
        let count = self.repository.fetch_links_for_messages(&ids).await?;
        self.recompute();
        Ok(count)
    }

    /// Record a new link and recompute.
    pub async fn create_link(&mut self, link: Link) -> AppResult<Link> {
        let created = self.repository.create(link).await?;
        self.recompute();
        Ok(created)
    }

    /// Record several links atomically and recompute. A failed batch adds
    /// nothing and leaves the graph unchanged.
    pub async fn create_links(&mut self, links: Vec<Link>) -> AppResult<Vec<Link>> {
        let created = self.repository.create_batch(links).await?;
        self.recompute();
        Ok(created)
    }

    /// Update one link's weight and recompute.
    pub async fn update_link_weight(&mut self, link_id: &str, weight: f64) -> AppResult<Link> {
        let updated = self.repository.update_weight(link_id, weight).await?;
        self.recompute();
        Ok(updated)
    }

    /// Delete one link and recompute.
    pub async fn delete_link(&mut self, link_id: &str) -> AppResult<()> {
        self.repository.delete(link_id).await?;
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        let links = self.repository.links().to_vec();
        self.index = GraphIndex::build(&self.messages, &links);
        self.groups = group::assemble_groups(&self.messages, &self.index, &links);
        debug!(
            messages = self.messages.len(),
            links = links.len(),
            groups = self.groups.len(),
            "Recomputed candidate graph"
        );
    }
}

fn flatten_into<'a>(node: &'a CandidateNode, out: &mut Vec<&'a CandidateNode>) {
    out.push(node);
    for child in &node.children {
        flatten_into(child, out);
    }
}
