//! Text and structural comparison of nodes.

use sift_core::{Node, TokenCategory};

/// Compares leaf texts, optionally ignoring case.
///
/// Comment texts are compared with runs of whitespace collapsed so that
/// reformatted comments still match.
pub(crate) fn texts_equal(
    pattern: &str,
    candidate: &str,
    category: TokenCategory,
    case_sensitive: bool,
) -> bool {
    if category == TokenCategory::Comment {
        let left = collapse_whitespace(pattern);
        let right = collapse_whitespace(candidate);
        return chars_equal(&left, &right, case_sensitive);
    }
    chars_equal(pattern, candidate, case_sensitive)
}

fn chars_equal(left: &str, right: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        return left == right;
    }
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns whether two subtrees have the same shape and leaf texts.
///
/// Comments are ignored on both sides.
pub(crate) fn structurally_equal(left: Node<'_>, right: Node<'_>, case_sensitive: bool) -> bool {
    let mut pending = vec![(left, right)];
    while let Some((a, b)) = pending.pop() {
        if a.kind() != b.kind() || a.is_leaf() != b.is_leaf() {
            return false;
        }
        if a.is_leaf() {
            if !texts_equal(a.text(), b.text(), a.category(), case_sensitive) {
                return false;
            }
            continue;
        }
        let left_children: Vec<_> = a.children().filter(|child| !is_comment(*child)).collect();
        let right_children: Vec<_> = b.children().filter(|child| !is_comment(*child)).collect();
        if left_children.len() != right_children.len() {
            return false;
        }
        pending.extend(left_children.into_iter().zip(right_children));
    }
    true
}

/// Returns whether `node` is a whole comment.
pub(crate) fn is_comment(node: Node<'_>) -> bool {
    node.is_named() && node.category() == TokenCategory::Comment && node.is_leaf()
}
