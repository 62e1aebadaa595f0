//! Graph assembly over untrusted message/link snapshots.
//!
//! The pipeline runs in four synchronous stages, recomputed whenever the
//! input snapshot changes:
//!
//! 1. [`GraphIndex`]: arena plus children/link lookup maps, O(n) build
//! 2. [`assemble`]: cycle-safe recursive subtree composition per candidate
//! 3. [`score`]: evaluation-weight aggregation (node-local and per-path)
//! 4. [`group`]: one ranked [`RequestGroup`] per originating user message
//!
//! [`CandidateGraph`] is the facade over all four. Every read on it is total:
//! dangling parents, cycles, and missing group ids degrade to empty results
//! or unscored nodes, never to errors.

pub mod assemble;
mod engine;
pub mod group;
mod index;
pub mod score;

pub use engine::{CandidateGraph, GraphStats};
pub use index::GraphIndex;

use serde::{Deserialize, Serialize};

use crate::model::{Link, Message};

/// One materialized response candidate in an assembled tree.
///
/// Owns its children exclusively; the wrapped [`Message`] is a copy of the
/// shared read-only record. A message revisited within the same traversal is
/// materialized once more as an empty leaf (no children, no links, no score).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateNode {
    /// The underlying message record.
    pub message: Message,
    /// Child nodes in created_at-ascending order.
    pub children: Vec<CandidateNode>,
    /// Every link touching this message, incoming and outgoing, deduplicated.
    pub links: Vec<Link>,
    /// Depth below the candidate root (root = 0).
    pub depth: usize,
    /// Node-local evaluation score. `None` means unscored, not zero.
    pub path_score: Option<f64>,
}

impl CandidateNode {
    /// Number of nodes in this subtree, including self.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(CandidateNode::subtree_len)
            .sum::<usize>()
    }
}

/// All response candidates triggered by one originating user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestGroup {
    /// The group's request_group_id, or the user message id when absent.
    pub id: String,
    /// The originating user message.
    pub request: Message,
    /// Root-level candidate trees, created_at-ascending.
    pub candidates: Vec<CandidateNode>,
    /// Cross-chat links touching any member of this group.
    pub cross_links: Vec<Link>,
    /// Highest root-level candidate score, if any candidate is scored.
    pub best_path_score: Option<f64>,
    /// Remaining root-level scores, descending.
    pub alternatives: Vec<AlternativeScore>,
}

/// A non-best root-level score, in rank order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeScore {
    /// 1-based position among the alternatives.
    pub rank: usize,
    /// The candidate's node-local score.
    pub score: f64,
}
