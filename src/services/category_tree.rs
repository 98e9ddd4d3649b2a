//! Flat parent-pointer categories to a nested tree.
//!
//! The build is iterative: children are indexed by parent position and the
//! tree is walked breadth-first with an explicit queue, then assembled
//! bottom-up. Nesting is capped at `MAX_TREE_DEPTH` levels, so serializing
//! or dropping the result stays within a bounded stack.

use crate::models::category::{Category, CategoryNode};
use std::collections::{HashMap, VecDeque};
use tracing::warn;

/// Deepest nesting produced by `build_tree`. Items further down start a
/// new root.
pub const MAX_TREE_DEPTH: usize = 256;

/// Build the category forest.
///
/// - Roots are items without a parent, items whose parent is not in
///   `items`, and items that are their own parent.
/// - Items only reachable through a parent cycle are attached by promoting
///   the first of them (in input order) to a root.
/// - An item that would sit deeper than `MAX_TREE_DEPTH` levels is promoted
///   to a root, keeping its own subtree.
/// - Every item appears exactly once; siblings keep input order.
pub fn build_tree(items: Vec<Category>) -> Vec<CategoryNode> {
    let count = items.len();
    let position: HashMap<_, _> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| (item.id, idx))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut roots = VecDeque::new();
    for (idx, item) in items.iter().enumerate() {
        match item.parent_id.and_then(|p| position.get(&p).copied()) {
            Some(parent) if parent != idx => children[parent].push(idx),
            _ => roots.push_back(idx),
        }
    }

    let mut traversal = Traversal {
        children: &children,
        visited: vec![false; count],
        order: Vec::with_capacity(count),
        too_deep: VecDeque::new(),
    };

    let mut next_unvisited = 0;
    loop {
        while let Some(root) = roots.pop_front() {
            traversal.walk(root);
            while let Some(deep) = traversal.too_deep.pop_front() {
                warn!(
                    category = %items[deep].id,
                    slug = %items[deep].slug,
                    max_depth = MAX_TREE_DEPTH,
                    "category nested too deeply, promoting to root"
                );
                roots.push_back(deep);
            }
        }

        while next_unvisited < count && traversal.visited[next_unvisited] {
            next_unvisited += 1;
        }
        if next_unvisited == count {
            break;
        }
        warn!(
            category = %items[next_unvisited].id,
            slug = %items[next_unvisited].slug,
            "parent cycle detected, promoting category to root"
        );
        roots.push_back(next_unvisited);
    }
    let order = traversal.order;

    // Assemble leaves first. Reverse traversal pushes siblings back to
    // front, so each child list is reversed once it is complete.
    let mut slots: Vec<Option<Category>> = items.into_iter().map(Some).collect();
    let mut built: Vec<Vec<CategoryNode>> = (0..count).map(|_| Vec::new()).collect();
    let mut forest = Vec::new();
    for &(idx, parent) in order.iter().rev() {
        let mut kids = std::mem::take(&mut built[idx]);
        kids.reverse();
        let Some(category) = slots[idx].take() else {
            continue;
        };
        let node = CategoryNode {
            category,
            children: kids,
        };
        match parent {
            Some(parent) => built[parent].push(node),
            None => forest.push(node),
        }
    }
    forest.reverse();
    forest
}

/// Breadth-first traversal state shared by every root's walk.
struct Traversal<'a> {
    children: &'a [Vec<usize>],
    visited: Vec<bool>,
    /// (item, parent in the tree), parents always before their children.
    order: Vec<(usize, Option<usize>)>,
    /// Children cut off by the depth cap, waiting to become roots.
    too_deep: VecDeque<usize>,
}

impl Traversal<'_> {
    fn walk(&mut self, start: usize) {
        let children = self.children;
        self.visited[start] = true;
        let mut queue = VecDeque::from([(start, None, 0usize)]);
        while let Some((idx, parent, depth)) = queue.pop_front() {
            self.order.push((idx, parent));
            for &child in &children[idx] {
                if self.visited[child] {
                    continue;
                }
                self.visited[child] = true;
                if depth + 1 < MAX_TREE_DEPTH {
                    queue.push_back((child, Some(idx), depth + 1));
                } else {
                    self.too_deep.push_back(child);
                }
            }
        }
    }
}
