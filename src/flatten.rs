//! Comment-tree flattening.
//!
//! Converts the nested reply structure returned for a single post into a
//! flat, order-preserving sequence of [`Comment`] records with explicit
//! parent linkage. Depth-first pre-order: each subtree is emitted in full
//! immediately after its parent, before any sibling. Non-comment listing
//! items are skipped outright. A node whose author and body both carry the
//! deletion marker is dropped, but its replies are still walked and stay
//! parented to the dropped node's ID.
//!
//! The walk is a pure transform: same input tree, same output sequence.

use std::collections::HashSet;

use crate::models::{Comment, DELETED};
use crate::reddit::{CommentData, CommentNode};

/// Flatten the top-level nodes of a post's comment tree.
///
/// `post_id` is the owning post's fullname (`t3_…`) and becomes the
/// `parent_id` of every top-level comment. Output is deduplicated by
/// comment ID; the first occurrence wins.
pub fn flatten_comments(post_id: &str, roots: &[CommentNode]) -> Vec<Comment> {
    let mut out = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for node in roots {
        walk(post_id, post_id, node, &mut out, &mut seen);
    }

    out
}

fn walk(
    post_id: &str,
    parent_id: &str,
    node: &CommentNode,
    out: &mut Vec<Comment>,
    seen: &mut HashSet<String>,
) {
    let CommentNode::Comment(data) = node else {
        return;
    };

    let id = data.fullname();
    if !seen.insert(id.clone()) {
        // Duplicate node: its subtree can only repeat already-seen IDs.
        return;
    }

    if !is_fully_deleted(data) {
        out.push(to_comment(data, &id, post_id, parent_id));
    }

    // Replies are independent nodes with their own kind tags; they are
    // walked even when this node was dropped, parented to its ID.
    for reply in &data.replies {
        walk(post_id, &id, reply, out, seen);
    }
}

/// A node is dropped entirely only when author AND body both carry the
/// deletion marker.
fn is_fully_deleted(data: &CommentData) -> bool {
    data.author.as_deref().unwrap_or(DELETED) == DELETED
        && data.body.as_deref().unwrap_or("") == DELETED
}

fn to_comment(data: &CommentData, id: &str, post_id: &str, parent_id: &str) -> Comment {
    Comment {
        id: id.to_string(),
        post_id: post_id.to_string(),
        parent_id: parent_id.to_string(),
        author: data
            .author
            .clone()
            .unwrap_or_else(|| DELETED.to_string()),
        body: data.body.clone().unwrap_or_default(),
        score: data.score,
        created_at: data.created_utc as i64,
        permalink: data.permalink.clone(),
        // Stamped by the store on upsert; left at zero here so the walk
        // stays deterministic.
        last_updated: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, author: Option<&str>, body: &str, replies: Vec<CommentNode>) -> CommentNode {
        CommentNode::Comment(Box::new(CommentData {
            id: id.to_string(),
            author: author.map(str::to_string),
            body: Some(body.to_string()),
            score: 1,
            created_utc: 1_700_000_000.0,
            permalink: format!("/r/test/comments/abc/x/{}/", id),
            replies,
        }))
    }

    fn ids(comments: &[Comment]) -> Vec<&str> {
        comments.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_empty_tree() {
        assert!(flatten_comments("t3_abc", &[]).is_empty());
    }

    #[test]
    fn test_top_level_parented_to_post() {
        let roots = vec![comment("c1", Some("alice"), "hi", vec![])];
        let flat = flatten_comments("t3_abc", &roots);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].id, "t1_c1");
        assert_eq!(flat[0].post_id, "t3_abc");
        assert_eq!(flat[0].parent_id, "t3_abc");
    }

    #[test]
    fn test_preorder_subtree_before_sibling() {
        let roots = vec![
            comment(
                "c1",
                Some("alice"),
                "first",
                vec![
                    comment("c2", Some("bob"), "reply", vec![comment("c3", Some("eve"), "deep", vec![])]),
                ],
            ),
            comment("c4", Some("mallory"), "second", vec![]),
        ];
        let flat = flatten_comments("t3_abc", &roots);
        assert_eq!(ids(&flat), vec!["t1_c1", "t1_c2", "t1_c3", "t1_c4"]);
        assert_eq!(flat[1].parent_id, "t1_c1");
        assert_eq!(flat[2].parent_id, "t1_c2");
        assert_eq!(flat[3].parent_id, "t3_abc");
    }

    #[test]
    fn test_non_comment_kinds_skipped() {
        let roots = vec![
            comment("c1", Some("alice"), "hi", vec![CommentNode::Other]),
            CommentNode::Other,
        ];
        let flat = flatten_comments("t3_abc", &roots);
        assert_eq!(ids(&flat), vec!["t1_c1"]);
    }

    #[test]
    fn test_deleted_node_dropped_children_survive() {
        // Post "t3_abc" with a normal comment and a fully-deleted one whose
        // reply is by a real author.
        let roots = vec![
            comment("c1", Some("alice"), "hi", vec![]),
            comment(
                "c2",
                Some(DELETED),
                DELETED,
                vec![comment("c3", Some("bob"), "still here", vec![])],
            ),
        ];
        let flat = flatten_comments("t3_abc", &roots);
        assert_eq!(ids(&flat), vec!["t1_c1", "t1_c3"]);
        assert_eq!(flat[0].parent_id, "t3_abc");
        // The surviving reply stays parented to the dropped node's ID.
        assert_eq!(flat[1].parent_id, "t1_c2");
    }

    #[test]
    fn test_deleted_author_alone_is_kept() {
        let roots = vec![comment("c1", None, "body survives", vec![])];
        let flat = flatten_comments("t3_abc", &roots);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].author, DELETED);
        assert_eq!(flat[0].body, "body survives");
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let roots = vec![
            comment("c1", Some("alice"), "original", vec![]),
            comment("c1", Some("alice"), "duplicate", vec![]),
        ];
        let flat = flatten_comments("t3_abc", &roots);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].body, "original");
    }

    #[test]
    fn test_deterministic() {
        let roots = vec![
            comment(
                "c1",
                Some("alice"),
                "a",
                vec![comment("c2", Some(DELETED), DELETED, vec![comment("c3", Some("bob"), "b", vec![])])],
            ),
            comment("c4", Some("eve"), "c", vec![]),
        ];
        let first = flatten_comments("t3_abc", &roots);
        let second = flatten_comments("t3_abc", &roots);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.parent_id, b.parent_id);
            assert_eq!(a.body, b.body);
        }
    }
}
