//! Requirement tree for display

use serde::Serialize;
use std::fmt;

/// A spec name and the specs it requires, for human-readable output only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequireNode {
    pub name: String,
    pub children: Vec<RequireNode>,
}

impl RequireNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes below this one
    pub fn descendants(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendants())
            .sum()
    }

    /// Render as box-drawing lines, root first
    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![self.name.clone()];
        render_children(&self.children, "", &mut lines);
        lines
    }
}

fn render_children(children: &[RequireNode], prefix: &str, lines: &mut Vec<String>) {
    for (index, child) in children.iter().enumerate() {
        let last = index + 1 == children.len();
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        lines.push(format!("{prefix}{branch}{}", child.name));
        render_children(&child.children, &format!("{prefix}{indent}"), lines);
    }
}

impl fmt::Display for RequireNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let mut root = RequireNode::new("web");
        let mut base = RequireNode::new("base");
        base.children.push(RequireNode::new("core"));
        root.children.push(base);
        root.children.push(RequireNode::new("tls"));

        assert_eq!(
            root.render(),
            vec!["web", "├── base", "│   └── core", "└── tls"]
        );
        assert_eq!(root.descendants(), 3);
        assert!(!root.is_leaf());
    }

    #[test]
    fn test_leaf_display() {
        assert_eq!(RequireNode::new("solo").to_string(), "solo");
    }
}
