//! Evaluation-weight aggregation.
//!
//! Both forms are pure and total. An empty scoring set yields `None`, which
//! is distinct from a score of zero: `None` means nobody has evaluated yet.

use std::collections::HashSet;

use crate::model::{Link, Message};

/// Mean weight of the evaluation links in a node's own link list.
///
/// Links with a null weight or a non-evaluation kind never contribute.
pub fn node_score(links: &[Link]) -> Option<f64> {
    mean(links.iter().filter(|l| l.is_scoring()).filter_map(|l| l.weight))
}

/// Mean weight of evaluation links touching any message on an ordered path.
///
/// A link qualifies when either endpoint's id is in the path's id set.
pub fn path_score(path: &[Message], links: &[Link]) -> Option<f64> {
    let ids: HashSet<&str> = path.iter().map(|m| m.id.as_str()).collect();
    mean(
        links
            .iter()
            .filter(|l| l.is_scoring())
            .filter(|l| {
                ids.contains(l.source_message_id.as_str())
                    || ids.contains(l.target_message_id.as_str())
            })
            .filter_map(|l| l.weight),
    )
}

fn mean(weights: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for weight in weights {
        sum += weight;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
