use serde::{Deserialize, Serialize};

/// A node in the comparison result tree.
///
/// The tree mirrors the containment structure of the two inputs: the root
/// describes the top-level files, interior nodes describe containers, and
/// leaves carry the actual unified diff or a comment explaining why the
/// two sides differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    /// Label for the first input, typically a member-relative path
    pub source1: String,
    /// Label for the second input
    pub source2: String,
    /// Human-readable annotation ("symlink", "gzip exited with 1", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Unified diff between the two sides, if one was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unified_diff: Option<String>,
    /// Child differences in deterministic traversal order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Difference>,
}

impl Difference {
    pub fn new(source1: impl Into<String>, source2: impl Into<String>) -> Self {
        Self {
            source1: source1.into(),
            source2: source2.into(),
            comment: None,
            unified_diff: None,
            details: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_unified_diff(mut self, diff: impl Into<String>) -> Self {
        self.unified_diff = Some(diff.into());
        self
    }

    /// A difference may only be emitted when it carries a diff, a comment,
    /// or at least one child.
    pub fn has_content(&self) -> bool {
        self.unified_diff.as_ref().is_some_and(|d| !d.is_empty())
            || self.comment.is_some()
            || !self.details.is_empty()
    }

    /// Total number of nodes in this subtree, the root included.
    pub fn node_count(&self) -> usize {
        1 + self.details.iter().map(Difference::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_difference_has_no_content() {
        let diff = Difference::new("a", "b");
        assert!(!diff.has_content());
    }

    #[test]
    fn test_comment_is_content() {
        let diff = Difference::new("a", "b").with_comment("symlink");
        assert!(diff.has_content());
    }

    #[test]
    fn test_node_count_counts_nested_details() {
        let mut root = Difference::new("a", "b");
        let mut child = Difference::new("m", "m");
        child.details.push(Difference::new("x", "x").with_comment("c"));
        root.details.push(child);
        assert_eq!(root.node_count(), 3);
    }
}
