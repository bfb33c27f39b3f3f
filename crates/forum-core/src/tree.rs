//! Comment tree builder.
//!
//! Turns the flat comment list of one post into a deterministic pre-order
//! walk of `(comment, depth)` pairs. Siblings are ordered by creation time,
//! then id. Every input comment is emitted exactly once whatever the shape of
//! the input: a comment whose parent is missing from the set is treated as
//! top-level, and a reference cycle is broken at its earliest member.
//!
//! The forest is an arena: nodes live in one `Vec`, and each node owns the
//! list of its children's indices.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::content::Comment;

/// Anything that can be placed in a reply forest.
pub trait Threaded {
  fn node_id(&self) -> Uuid;
  fn parent_id(&self) -> Option<Uuid>;
  fn created_at(&self) -> DateTime<Utc>;
}

impl Threaded for Comment {
  fn node_id(&self) -> Uuid { self.comment_id }

  fn parent_id(&self) -> Option<Uuid> { self.parent_id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

/// The reply forest of one post.
#[derive(Debug, Clone)]
pub struct CommentTree<T> {
  nodes:    Vec<T>,
  roots:    Vec<usize>,
  children: Vec<Vec<usize>>,
}

impl<T: Threaded> CommentTree<T> {
  pub fn build(items: impl IntoIterator<Item = T>) -> Self {
    let mut nodes: Vec<T> = items.into_iter().collect();
    // Storage hands rows over in timestamp order already; this only settles
    // ties and guards against callers that don't.
    nodes.sort_by_key(|n| (n.created_at(), n.node_id()));

    let index: HashMap<Uuid, usize> = nodes
      .iter()
      .enumerate()
      .map(|(i, n)| (n.node_id(), i))
      .collect();

    let mut roots = Vec::new();
    let mut children = vec![Vec::new(); nodes.len()];
    let mut parent_of = vec![None; nodes.len()];

    // Indices are visited in sorted order, so every child list comes out
    // sorted too.
    for (i, node) in nodes.iter().enumerate() {
      match node.parent_id().and_then(|p| index.get(&p).copied()) {
        Some(p) if p != i => {
          children[p].push(i);
          parent_of[i] = Some(p);
        }
        _ => roots.push(i),
      }
    }

    let mut reached = vec![false; nodes.len()];
    for &root in &roots {
      mark_reached(root, &children, &mut reached);
    }

    // Anything still unreached sits on a cycle. Promote the earliest node of
    // each cycle to top level.
    let mut promoted = false;
    for i in 0..nodes.len() {
      if reached[i] {
        continue;
      }
      if let Some(p) = parent_of[i].take() {
        children[p].retain(|&c| c != i);
      }
      roots.push(i);
      mark_reached(i, &children, &mut reached);
      promoted = true;
    }
    if promoted {
      roots.sort_unstable();
    }

    Self { nodes, roots, children }
  }
}

impl<T> CommentTree<T> {
  /// Number of comments in the tree; always the number handed to `build`.
  pub fn len(&self) -> usize { self.nodes.len() }

  pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

  /// Start a fresh pre-order walk. Walks are independent of each other.
  pub fn iter(&self) -> Walk<'_, T> {
    Walk {
      tree:  self,
      stack: self.roots.iter().rev().map(|&i| (i, 0)).collect(),
    }
  }
}

impl<'a, T> IntoIterator for &'a CommentTree<T> {
  type Item = (&'a T, usize);
  type IntoIter = Walk<'a, T>;

  fn into_iter(self) -> Self::IntoIter { self.iter() }
}

fn mark_reached(start: usize, children: &[Vec<usize>], reached: &mut [bool]) {
  let mut stack = vec![start];
  while let Some(i) = stack.pop() {
    if std::mem::replace(&mut reached[i], true) {
      continue;
    }
    stack.extend(children[i].iter().copied().filter(|&c| !reached[c]));
  }
}

/// Lazy pre-order iterator over a [`CommentTree`], yielding `(node, depth)`.
/// Depth is 0 for top-level comments.
pub struct Walk<'a, T> {
  tree:  &'a CommentTree<T>,
  stack: Vec<(usize, usize)>,
}

impl<'a, T> Iterator for Walk<'a, T> {
  type Item = (&'a T, usize);

  fn next(&mut self) -> Option<Self::Item> {
    let (i, depth) = self.stack.pop()?;
    self
      .stack
      .extend(self.tree.children[i].iter().rev().map(|&c| (c, depth + 1)));
    Some((&self.tree.nodes[i], depth))
  }
}

/// Build the tree for `comments` and flatten it into an owned, ordered list.
pub fn build_tree(comments: Vec<Comment>) -> Vec<(Comment, usize)> {
  let tree = CommentTree::build(comments);
  tree.iter().map(|(c, depth)| (c.clone(), depth)).collect()
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[derive(Debug, Clone)]
  struct Node {
    id:     Uuid,
    parent: Option<Uuid>,
    at:     DateTime<Utc>,
  }

  impl Threaded for Node {
    fn node_id(&self) -> Uuid { self.id }

    fn parent_id(&self) -> Option<Uuid> { self.parent }

    fn created_at(&self) -> DateTime<Utc> { self.at }
  }

  fn id(n: u128) -> Uuid { Uuid::from_u128(n) }

  fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
  }

  fn node(n: u128, parent: Option<u128>, minutes: i64) -> Node {
    Node { id: id(n), parent: parent.map(id), at: at(minutes) }
  }

  fn order(tree: &CommentTree<Node>) -> Vec<(u128, usize)> {
    tree.iter().map(|(n, d)| (n.id.as_u128(), d)).collect()
  }

  #[test]
  fn empty_input() {
    let tree = CommentTree::<Node>::build(Vec::new());
    assert!(tree.is_empty());
    assert_eq!(tree.iter().count(), 0);
  }

  #[test]
  fn children_follow_their_parent_before_next_sibling() {
    let tree = CommentTree::build(vec![
      node(1, None, 0),
      node(2, None, 1),
      node(3, Some(1), 2),
      node(4, Some(3), 3),
      node(5, Some(1), 4),
      node(6, Some(2), 5),
    ]);
    assert_eq!(order(&tree), vec![(1, 0), (3, 1), (4, 2), (5, 1), (2, 0), (6, 1)]);
  }

  #[test]
  fn input_order_does_not_matter() {
    let tree = CommentTree::build(vec![
      node(5, Some(1), 4),
      node(2, None, 1),
      node(3, Some(1), 2),
      node(1, None, 0),
    ]);
    assert_eq!(order(&tree), vec![(1, 0), (3, 1), (5, 1), (2, 0)]);
  }

  #[test]
  fn simultaneous_timestamps_tie_break_on_id() {
    let tree = CommentTree::build(vec![
      node(9, None, 0),
      node(4, None, 0),
      node(7, Some(4), 1),
      node(6, Some(4), 1),
    ]);
    assert_eq!(order(&tree), vec![(4, 0), (6, 1), (7, 1), (9, 0)]);
  }

  #[test]
  fn deep_chain_has_unbounded_depth() {
    let mut nodes = vec![node(0, None, 0)];
    for i in 1..500u128 {
      nodes.push(node(i, Some(i - 1), i as i64));
    }
    let tree = CommentTree::build(nodes);
    let walked = order(&tree);
    assert_eq!(walked.len(), 500);
    assert_eq!(walked.last(), Some(&(499, 499)));
  }

  #[test]
  fn orphan_becomes_top_level() {
    let tree = CommentTree::build(vec![
      node(1, None, 0),
      node(2, Some(42), 1),
      node(3, Some(2), 2),
    ]);
    assert_eq!(order(&tree), vec![(1, 0), (2, 0), (3, 1)]);
  }

  #[test]
  fn cycle_is_broken_not_dropped() {
    let tree = CommentTree::build(vec![
      node(1, Some(2), 0),
      node(2, Some(1), 1),
      node(3, Some(3), 2),
    ]);
    assert_eq!(order(&tree), vec![(1, 0), (2, 1), (3, 0)]);
  }

  #[test]
  fn walk_is_restartable() {
    let tree = CommentTree::build(vec![node(1, None, 0), node(2, Some(1), 1)]);
    let mut first = tree.iter();
    first.next();
    assert_eq!(order(&tree), vec![(1, 0), (2, 1)]);
    assert_eq!(first.map(|(n, _)| n.id.as_u128()).collect::<Vec<_>>(), vec![2]);
  }

  #[test]
  fn every_node_once_and_parents_first() {
    // Deterministic pseudo-random forests of varying shape.
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = || {
      seed ^= seed << 13;
      seed ^= seed >> 7;
      seed ^= seed << 17;
      seed
    };

    for size in [1usize, 2, 7, 40, 300] {
      let mut nodes = Vec::with_capacity(size);
      for i in 0..size as u128 {
        let parent = if i == 0 || next() % 4 == 0 {
          None
        } else {
          Some((next() as u128) % i)
        };
        nodes.push(node(i, parent, (next() % 5) as i64 + i as i64));
      }

      let tree = CommentTree::build(nodes.clone());
      let walked: Vec<&Node> = tree.iter().map(|(n, _)| n).collect();
      assert_eq!(walked.len(), size);

      let position: HashMap<Uuid, usize> =
        walked.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
      assert_eq!(position.len(), size);
      for n in &nodes {
        if let Some(p) = n.parent {
          assert!(position[&p] < position[&n.id]);
        }
      }
    }
  }
}
