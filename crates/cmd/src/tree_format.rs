// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Box-drawing rendering of a walked directory tree
//!
//! ```text
//! .
//! ├─┬ subdir
//! │ ├── a.txt
//! │ └── b.txt
//! └── test.txt
//! ```

/// A labelled node with ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Assembles a tree from depth-first `(label, depth)` events, as produced
/// by `walk_dir`: each node arrives after its parent and before any later
/// sibling of that parent.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    open: Vec<TreeNode>,
    root: Option<TreeNode>,
}

impl TreeBuilder {
    pub fn push(&mut self, label: impl Into<String>, depth: usize) {
        self.close_to(depth);
        self.open.push(TreeNode::new(label));
    }

    /// The assembled root, if any node was pushed
    pub fn finish(mut self) -> Option<TreeNode> {
        self.close_to(0);
        self.root
    }

    /// Attach open nodes deeper than `depth` to their parents
    fn close_to(&mut self, depth: usize) {
        while self.open.len() > depth {
            let Some(node) = self.open.pop() else {
                break;
            };
            match self.open.last_mut() {
                Some(parent) => parent.children.push(node),
                None => self.root = Some(node),
            }
        }
    }
}

/// Render a tree, one node per line, each line ending in a newline
#[must_use]
pub fn format_tree(root: &TreeNode) -> String {
    let mut output = format!("{}\n", root.label);
    format_children(&mut output, &root.children, "");
    output
}

fn format_children(output: &mut String, children: &[TreeNode], prefix: &str) {
    for (index, child) in children.iter().enumerate() {
        let last = index + 1 == children.len();
        let connector = match (last, child.children.is_empty()) {
            (false, true) => "├──",
            (false, false) => "├─┬",
            (true, true) => "└──",
            (true, false) => "└─┬",
        };

        output.push_str(&format!("{prefix}{connector} {}\n", child.label));

        if !child.children.is_empty() {
            let continuation = if last { ' ' } else { '│' };
            format_children(output, &child.children, &format!("{prefix}{continuation} "));
        }
    }
}
