//! Recursive candidate subtree composition.
//!
//! Source data cannot be assumed acyclic: parent pointers come from multiple
//! producers and the link table may reference anything. Assembly therefore
//! carries a visited set for the whole traversal and materializes a revisited
//! message as a degenerate leaf instead of erroring or recursing forever.

use std::collections::HashSet;

use tracing::debug;

use super::{score, CandidateNode, GraphIndex};
use crate::model::Message;

/// Build the candidate subtree rooted at `message`.
///
/// The visited set is shared across the entire traversal, so a diamond
/// (one message reachable under two parents) collapses to a single full
/// materialization at its first encounter; later encounters become empty
/// leaves. Children are assembled in created_at-ascending order.
pub fn build_subtree(
    index: &GraphIndex,
    message: &Message,
    depth: usize,
    visited: &mut HashSet<String>,
) -> CandidateNode {
    if !visited.insert(message.id.clone()) {
        debug!(
            message_id = %message.id,
            depth,
            "Revisited message during assembly, emitting empty leaf"
        );
        return CandidateNode {
            message: message.clone(),
            children: Vec::new(),
            links: Vec::new(),
            depth,
            path_score: None,
        };
    }

    let links = index.links_touching(&message.id);
    let path_score = score::node_score(&links);

    let mut children = Vec::new();
    for child_id in index.children_of(&message.id) {
        if let Some(child) = index.message(child_id) {
            children.push(build_subtree(index, child, depth + 1, visited));
        }
    }

    CandidateNode {
        message: message.clone(),
        children,
        links,
        depth,
        path_score,
    }
}
