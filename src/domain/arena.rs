//! Arena-backed company tree.
//!
//! Nodes live in a generational arena owned by the tree; children and the
//! parent back-reference are arena indices, so no node is ever shared between
//! two trees and the whole graph is dropped with its owner.

use std::fmt;

use generational_arena::{Arena, Index};
use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::{CompanyRecord, FlatCompanyView};

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct CompanyNode {
    /// Company attributes for this node
    pub data: CompanyRecord,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in relation input order
    pub children: Vec<Index>,
}

impl CompanyNode {
    pub(crate) fn new(data: CompanyRecord) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn code(&self) -> &str {
        &self.data.code
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for CompanyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}

/// A fully linked, acyclic company hierarchy with exactly one root.
///
/// Only [`crate::domain::HierarchyBuilder`] constructs it, so every index
/// stored in a node refers to a live arena slot.
#[derive(Debug, Clone)]
pub struct CompanyTree {
    arena: Arena<CompanyNode>,
    root: Index,
}

/// Stored level disagreeing with the depth the node has in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelMismatch {
    pub code: String,
    pub stored: u8,
    pub depth: usize,
}

impl CompanyTree {
    pub(crate) fn from_parts(arena: Arena<CompanyNode>, root: Index) -> Self {
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn root_node(&self) -> &CompanyNode {
        &self.arena[self.root]
    }

    pub fn get_node(&self, idx: Index) -> Option<&CompanyNode> {
        self.arena.get(idx)
    }

    /// Number of companies in the tree, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal of the whole tree.
    pub fn iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self, self.root)
    }

    /// View of the whole tree as a subtree rooted at the root.
    pub fn as_subtree(&self) -> Subtree<'_> {
        Subtree {
            tree: self,
            index: self.root,
        }
    }

    pub(crate) fn subtree(&self, index: Index) -> Subtree<'_> {
        Subtree { tree: self, index }
    }

    /// Number of levels below and including the root.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 1usize)];

        while let Some((idx, depth)) = stack.pop() {
            if let Some(node) = self.get_node(idx) {
                max_depth = max_depth.max(depth);
                stack.extend(node.children.iter().map(|&child| (child, depth + 1)));
            }
        }
        max_depth
    }

    /// Codes of all leaf companies, in pre-order.
    pub fn leaf_codes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.data.code.clone())
            .collect()
    }

    /// Companies whose stored level differs from their depth (root = 1).
    #[instrument(level = "debug", skip(self))]
    pub fn level_mismatches(&self) -> Vec<LevelMismatch> {
        let mut mismatches = Vec::new();
        let mut stack = vec![(self.root, 1usize)];

        while let Some((idx, depth)) = stack.pop() {
            if let Some(node) = self.get_node(idx) {
                if usize::from(node.data.level) != depth {
                    mismatches.push(LevelMismatch {
                        code: node.data.code.clone(),
                        stored: node.data.level,
                        depth,
                    });
                }
                for &child in node.children.iter().rev() {
                    stack.push((child, depth + 1));
                }
            }
        }
        mismatches
    }
}

/// A node of a [`CompanyTree`] together with all of its descendants.
#[derive(Debug, Clone, Copy)]
pub struct Subtree<'a> {
    tree: &'a CompanyTree,
    index: Index,
}

impl<'a> Subtree<'a> {
    pub fn index(&self) -> Index {
        self.index
    }

    pub fn node(&self) -> &'a CompanyNode {
        &self.tree.arena[self.index]
    }

    pub fn record(&self) -> &'a CompanyRecord {
        &self.node().data
    }

    pub fn parent(&self) -> Option<Subtree<'a>> {
        self.node().parent.map(|idx| self.tree.subtree(idx))
    }

    pub fn children(&self) -> impl Iterator<Item = Subtree<'a>> + 'a {
        let tree = self.tree;
        self.node().children.iter().map(move |&idx| tree.subtree(idx))
    }

    /// Pre-order traversal starting at this node.
    pub fn iter(&self) -> PreOrderIter<'a> {
        PreOrderIter::new(self.tree, self.index)
    }

    /// Number of companies in this subtree, itself included.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn to_nested(&self) -> NestedCompany {
        self.fold_up(|record, children| NestedCompany {
            company: record.clone(),
            children,
        })
    }

    pub fn to_tree_string(&self) -> Tree<String> {
        self.fold_up(|record, leaves| Tree::new(record.to_string()).with_leaves(leaves))
    }

    /// Combine the subtree bottom-up: `make` receives a record and the
    /// already combined values of its children, in child order.
    fn fold_up<T>(&self, mut make: impl FnMut(&'a CompanyRecord, Vec<T>) -> T) -> T {
        let mut root = FoldFrame::new(self.node());
        let mut stack: Vec<FoldFrame<'a, T>> = Vec::new();

        loop {
            let top = stack.last_mut().unwrap_or(&mut root);
            if let Some(&child) = top.node.children.get(top.next) {
                top.next += 1;
                stack.push(FoldFrame::new(&self.tree.arena[child]));
                continue;
            }
            match stack.pop() {
                Some(frame) => {
                    let value = make(&frame.node.data, frame.done);
                    stack.last_mut().unwrap_or(&mut root).done.push(value);
                }
                None => return make(&root.node.data, root.done),
            }
        }
    }

    pub fn flatten(&self) -> Vec<FlatCompanyView> {
        self.iter().map(|(_, node)| FlatCompanyView::from(&node.data)).collect()
    }
}

/// A node whose children are being combined by [`Subtree::fold_up`].
struct FoldFrame<'a, T> {
    node: &'a CompanyNode,
    next: usize,
    done: Vec<T>,
}

impl<'a, T> FoldFrame<'a, T> {
    fn new(node: &'a CompanyNode) -> Self {
        Self {
            node,
            next: 0,
            done: Vec::with_capacity(node.children.len()),
        }
    }
}

/// Serializable nested form of a subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedCompany {
    #[serde(flatten)]
    pub company: CompanyRecord,
    pub children: Vec<NestedCompany>,
}

pub struct PreOrderIter<'a> {
    tree: &'a CompanyTree,
    stack: Vec<Index>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a CompanyTree, start: Index) -> Self {
        Self {
            tree,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = (Index, &'a CompanyNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
