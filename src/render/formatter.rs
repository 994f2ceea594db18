use crate::definition::{NodeType, OutputNode};
use itertools::Itertools;

/// Formats resolved trees into human-readable outlines
pub struct TreeFormatter;

impl TreeFormatter {
    /// Format a resolved tree as an indented outline, one node per line.
    pub fn format_tree(root: &OutputNode) -> String {
        let mut result = Self::format_label(root);
        result.push('\n');
        Self::format_children(root, "", &mut result);
        result
    }

    /// Recursively formats the children of a node, extending the guide prefix per level.
    fn format_children(node: &OutputNode, prefix: &str, result: &mut String) {
        let children = node.children();
        for (index, child) in children.iter().enumerate() {
            let is_last = index + 1 == children.len();
            let (branch, guide) = if is_last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            result.push_str(prefix);
            result.push_str(branch);
            result.push_str(&Self::format_label(child));
            result.push('\n');
            Self::format_children(child, &format!("{}{}", prefix, guide), result);
        }
    }

    /// `<name> [<type>]`, followed by a loop marker or the metadata texts.
    fn format_label(node: &OutputNode) -> String {
        let mut label = format!("{} [{}]", node.name, node.node_type);
        if node.node_type == NodeType::DupeStopper {
            label.push_str(" <- loop");
        }
        let lines = node.metadata_lines();
        if !lines.is_empty() {
            let texts = lines.iter().map(|line| line.text.as_str()).join(", ");
            label.push_str(&format!(" ({})", texts));
        }
        label
    }
}
