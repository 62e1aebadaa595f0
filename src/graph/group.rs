//! Per-request grouping and ranking of candidate trees.
//!
//! Producers are inconsistent about lineage: newer writers set
//! `parent_message_id` on responses, older ones only stamped a shared
//! `request_group_id`. Root discovery therefore applies both checks, always.

use std::collections::HashSet;

use tracing::debug;

use super::{assemble, AlternativeScore, CandidateNode, GraphIndex, RequestGroup};
use crate::model::{Link, Message, Role};

/// Partition a snapshot into one [`RequestGroup`] per user message.
///
/// Groups come back in input order of their user messages; they are never
/// re-sorted by score.
pub fn assemble_groups(
    messages: &[Message],
    index: &GraphIndex,
    links: &[Link],
) -> Vec<RequestGroup> {
    messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|user| build_group(user, messages, index, links))
        .collect()
}

fn build_group(
    user: &Message,
    messages: &[Message],
    index: &GraphIndex,
    links: &[Link],
) -> RequestGroup {
    let group_id = user
        .request_group_id
        .clone()
        .unwrap_or_else(|| user.id.clone());

    let roots = discover_roots(user, &group_id, messages, index);

    // Cycle protection is per root, not per group: two roots may legitimately
    // share a descendant, and each gets its own full materialization.
    let mut candidates = Vec::with_capacity(roots.len());
    for root in roots {
        let mut visited = HashSet::new();
        candidates.push(assemble::build_subtree(index, root, 0, &mut visited));
    }

    let mut members = HashSet::new();
    members.insert(user.id.as_str());
    for candidate in &candidates {
        collect_member_ids(candidate, &mut members);
    }

    let cross_links: Vec<Link> = links
        .iter()
        .filter(|l| l.kind.is_cross_chat())
        .filter(|l| {
            members.contains(l.source_message_id.as_str())
                || members.contains(l.target_message_id.as_str())
        })
        .cloned()
        .collect();

    // Ranking uses each root's own node-local score: the first impression a
    // top-level candidate makes, not its whole subtree.
    let mut scores: Vec<f64> = candidates.iter().filter_map(|c| c.path_score).collect();
    scores.sort_by(|a, b| b.total_cmp(a));
    let best_path_score = scores.first().copied();
    let alternatives = scores
        .iter()
        .skip(1)
        .enumerate()
        .map(|(i, s)| AlternativeScore {
            rank: i + 1,
            score: *s,
        })
        .collect();

    RequestGroup {
        id: group_id,
        request: user.clone(),
        candidates,
        cross_links,
        best_path_score,
        alternatives,
    }
}

/// Dual root discovery: direct parent pointer, plus the legacy fallback of
/// group-mates with no lineage at all. Combined roots are chronological.
fn discover_roots<'a>(
    user: &Message,
    group_id: &str,
    messages: &'a [Message],
    index: &'a GraphIndex,
) -> Vec<&'a Message> {
    let mut roots: Vec<&Message> = index
        .children_of(&user.id)
        .iter()
        .filter_map(|id| index.message(id))
        .collect();

    let fallback: Vec<&Message> = messages
        .iter()
        .filter(|m| m.role != Role::User)
        .filter(|m| m.parent_message_id.is_none())
        .filter(|m| m.request_group_id.as_deref() == Some(group_id))
        .collect();

    if !fallback.is_empty() {
        debug!(
            group_id = %group_id,
            count = fallback.len(),
            "Adopting parentless group members as candidate roots"
        );
        roots.extend(fallback);
    }

    roots.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    roots.dedup_by(|a, b| a.id == b.id);
    roots
}

fn collect_member_ids<'a>(node: &'a CandidateNode, members: &mut HashSet<&'a str>) {
    members.insert(node.message.id.as_str());
    for child in &node.children {
        collect_member_ids(child, members);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinkKind;
    use chrono::{TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    fn groups_for(messages: &[Message], links: &[Link]) -> Vec<RequestGroup> {
        let index = GraphIndex::build(messages, links);
        assemble_groups(messages, &index, links)
    }

    #[test]
    fn test_two_scored_candidates_rank_descending() {
        // The canonical shape: one request, two parallel responses, each
        // evaluated against the request.
        let u1 = Message::new(Role::User, "question").with_created_at(at(9, 0));
        let m1 = Message::new(Role::Assistant, "answer one")
            .with_parent(&u1.id)
            .with_created_at(at(9, 1));
        let m2 = Message::new(Role::Critic, "answer two")
            .with_parent(&u1.id)
            .with_created_at(at(9, 2));
        let links = vec![
            Link::new(&m1.id, &u1.id, LinkKind::Evaluation).with_weight(8.0),
            Link::new(&m2.id, &u1.id, LinkKind::Evaluation).with_weight(6.0),
        ];

        let groups = groups_for(&[u1.clone(), m1.clone(), m2.clone()], &links);
        assert_eq!(groups.len(), 1);

        let group = &groups[0];
        assert_eq!(group.id, u1.id);
        assert_eq!(group.candidates.len(), 2);
        assert_eq!(group.candidates[0].message.id, m1.id);
        assert_eq!(group.candidates[0].path_score, Some(8.0));
        assert_eq!(group.candidates[1].path_score, Some(6.0));
        assert_eq!(group.best_path_score, Some(8.0));
        assert_eq!(group.alternatives.len(), 1);
        assert_eq!(group.alternatives[0].rank, 1);
        assert_eq!(group.alternatives[0].score, 6.0);
    }

    #[test]
    fn test_group_id_prefers_request_group_id() {
        let u1 = Message::new(Role::User, "q")
            .with_request_group("g-77")
            .with_created_at(at(9, 0));
        let groups = groups_for(&[u1], &[]);
        assert_eq!(groups[0].id, "g-77");
    }

    #[test]
    fn test_fallback_roots_for_legacy_data() {
        // Pre-lineage producers stamped only the group id.
        let u1 = Message::new(Role::User, "q")
            .with_request_group("g-1")
            .with_created_at(at(9, 0));
        let legacy = Message::new(Role::Assistant, "legacy answer")
            .with_request_group("g-1")
            .with_created_at(at(9, 5));
        let other_group = Message::new(Role::Assistant, "unrelated")
            .with_request_group("g-2")
            .with_created_at(at(9, 6));
        let parented = Message::new(Role::Assistant, "has lineage elsewhere")
            .with_request_group("g-1")
            .with_parent("somewhere")
            .with_created_at(at(9, 7));

        let groups = groups_for(&[u1, legacy.clone(), other_group, parented], &[]);
        let group = &groups[0];
        assert_eq!(group.candidates.len(), 1);
        assert_eq!(group.candidates[0].message.id, legacy.id);
    }

    #[test]
    fn test_fallback_excludes_other_user_messages() {
        let u1 = Message::new(Role::User, "first")
            .with_request_group("g-1")
            .with_created_at(at(9, 0));
        let u2 = Message::new(Role::User, "second in same group")
            .with_request_group("g-1")
            .with_created_at(at(9, 1));

        let groups = groups_for(&[u1, u2], &[]);
        assert_eq!(groups.len(), 2);
        assert!(groups[0].candidates.is_empty());
        assert!(groups[1].candidates.is_empty());
    }

    #[test]
    fn test_both_root_arms_combine_chronologically() {
        let u1 = Message::new(Role::User, "q")
            .with_request_group("g-1")
            .with_created_at(at(9, 0));
        let direct = Message::new(Role::Assistant, "direct")
            .with_parent(&u1.id)
            .with_created_at(at(9, 10));
        let legacy = Message::new(Role::Assistant, "legacy")
            .with_request_group("g-1")
            .with_created_at(at(9, 5));

        let groups = groups_for(&[u1, direct.clone(), legacy.clone()], &[]);
        let order: Vec<&str> = groups[0]
            .candidates
            .iter()
            .map(|c| c.message.id.as_str())
            .collect();
        assert_eq!(order, vec![legacy.id.as_str(), direct.id.as_str()]);
    }

    #[test]
    fn test_visited_set_is_fresh_per_root() {
        // A cycle pulls the request (and through it the sibling root) into
        // r1's traversal. r2's own build must still materialize fully rather
        // than inherit r1's visited set.
        let mut u1 = Message::new(Role::User, "q").with_created_at(at(9, 0));
        let r1 = Message::new(Role::Assistant, "r1")
            .with_parent(&u1.id)
            .with_created_at(at(9, 1));
        let r2 = Message::new(Role::Assistant, "r2")
            .with_parent(&u1.id)
            .with_created_at(at(9, 2));
        let c = Message::new(Role::Critic, "c")
            .with_parent(&r1.id)
            .with_created_at(at(9, 3));
        u1.parent_message_id = Some(c.id.clone());

        let groups = groups_for(&[u1.clone(), r1.clone(), r2.clone(), c], &[]);
        let group = &groups[0];
        assert_eq!(group.candidates.len(), 2);
        // r1's tree: r1 → c → u1 → {degenerate r1, full r2}.
        assert!(group.candidates[0].subtree_len() >= 5);
        // r2's own root build is untouched by r1's traversal.
        assert_eq!(group.candidates[1].message.id, r2.id);
        assert_eq!(group.candidates[1].subtree_len(), 1);
    }

    #[test]
    fn test_cross_links_collected_for_member_set() {
        let u1 = Message::new(Role::User, "q").with_created_at(at(9, 0));
        let r1 = Message::new(Role::Assistant, "r1")
            .with_parent(&u1.id)
            .with_created_at(at(9, 1));
        let forwarded = Link::new(&r1.id, "dchat-session-msg", LinkKind::ForwardToDchat);
        let returned = Link::new("dchat-session-msg", &r1.id, LinkKind::ReturnFromDchat);
        let unrelated = Link::new("x", "y", LinkKind::ForwardToDchat);
        let non_cross = Link::new(&r1.id, &u1.id, LinkKind::Reply);

        let groups = groups_for(
            &[u1, r1],
            &[forwarded.clone(), returned.clone(), unrelated, non_cross],
        );
        let ids: Vec<&str> = groups[0]
            .cross_links
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(ids, vec![forwarded.id.as_str(), returned.id.as_str()]);
    }

    #[test]
    fn test_groups_preserve_input_order_not_score_order() {
        let u1 = Message::new(Role::User, "first").with_created_at(at(9, 0));
        let u2 = Message::new(Role::User, "second").with_created_at(at(8, 0));
        let r2 = Message::new(Role::Assistant, "high scorer")
            .with_parent(&u2.id)
            .with_created_at(at(8, 1));
        let links = vec![Link::new(&r2.id, &u2.id, LinkKind::Evaluation).with_weight(10.0)];

        let groups = groups_for(&[u1.clone(), u2.clone(), r2], &links);
        assert_eq!(groups[0].request.id, u1.id);
        assert_eq!(groups[1].request.id, u2.id);
    }

    #[test]
    fn test_unscored_group_has_no_best_score() {
        let u1 = Message::new(Role::User, "q").with_created_at(at(9, 0));
        let r1 = Message::new(Role::Assistant, "r1")
            .with_parent(&u1.id)
            .with_created_at(at(9, 1));

        let groups = groups_for(&[u1, r1], &[]);
        assert_eq!(groups[0].best_path_score, None);
        assert!(groups[0].alternatives.is_empty());
    }

    #[test]
    fn test_ranking_ignores_descendant_scores() {
        // Only the root's own links rank it; a heavily-scored child does not.
        let u1 = Message::new(Role::User, "q").with_created_at(at(9, 0));
        let root = Message::new(Role::Assistant, "root")
            .with_parent(&u1.id)
            .with_created_at(at(9, 1));
        let child = Message::new(Role::Critic, "child")
            .with_parent(&root.id)
            .with_created_at(at(9, 2));
        let links = vec![Link::new("arb", &child.id, LinkKind::Evaluation).with_weight(9.0)];

        let groups = groups_for(&[u1, root, child], &links);
        assert_eq!(groups[0].best_path_score, None);
    }
}
