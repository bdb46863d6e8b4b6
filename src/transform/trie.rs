use std::collections::BTreeMap;
use std::collections::BTreeSet;
use crate::grammar::*;

/// Prefix tree over productions, each node remembering which of the
/// inserted productions pass through it.
#[derive(Debug, Clone)]
pub struct ProductionTrie {
  nodes: Vec<TrieNode>,
}

#[derive(Debug, Clone, Default)]
struct TrieNode {
  count: usize,
  /// distinct production indices, in insertion order
  indices: Vec<usize>,
  /// number of productions ending at this node
  ends: usize,
  children: BTreeMap<Symbol, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonPrefix {
  pub prefix: Production,
  /// sorted
  pub indices: Vec<usize>,
  /// sorted and distinct, the empty suffix is `[ε]`
  pub suffixes: Vec<Production>,
}

impl TrieNode {
  fn branches(&self) -> usize {
    self.children.len() + (self.ends > 0) as usize
  }
}

impl Default for ProductionTrie {
  fn default() -> Self {
    Self::new()
  }
}

impl ProductionTrie {
  pub fn new() -> Self {
    Self {
      nodes: vec![TrieNode::default()],
    }
  }

  pub fn insert(&mut self, production: &[Symbol], index: usize) {
    let mut node = 0;
    self.visit(node, index);
    for symbol in production {
      node = match self.nodes[node].children.get(symbol) {
        Some(&child) => child,
        None => {
          let child = self.nodes.len();
          self.nodes.push(TrieNode::default());
          self.nodes[node].children.insert(symbol.clone(), child);
          child
        }
      };
      self.visit(node, index);
    }
    self.nodes[node].ends += 1;
  }

  fn visit(&mut self, node: usize, index: usize) {
    let node = &mut self.nodes[node];
    node.count += 1;
    if !node.indices.contains(&index) {
      node.indices.push(index);
    }
  }

  /// Finds the longest non-empty prefix shared by at least two distinct
  /// productions where they also diverge. Ties go to the higher occurrence
  /// count, then to the lexicographically smaller prefix.
  pub fn longest_common_prefix(&self) -> Option<CommonPrefix> {
    let mut best: Option<(Production, usize)> = None;
    let mut stack: Vec<(usize, Production)> = vec![(0, vec![])];

    while let Some((id, prefix)) = stack.pop() {
      let node = &self.nodes[id];
      if !prefix.is_empty() && node.indices.len() >= 2 && node.branches() >= 2 {
        let better = match &best {
          None => true,
          Some((best_prefix, best_id)) => {
            let best_count = self.nodes[*best_id].count;
            prefix.len() > best_prefix.len()
              || (prefix.len() == best_prefix.len()
                && (node.count > best_count
                  || (node.count == best_count && prefix < *best_prefix)))
          }
        };
        if better {
          best = Some((prefix.clone(), id));
        }
      }

      for (symbol, &child) in &node.children {
        if self.nodes[child].count >= 2 {
          let mut prefix = prefix.clone();
          prefix.push(symbol.clone());
          stack.push((child, prefix));
        }
      }
    }

    best.map(|(prefix, id)| {
      let mut indices = self.nodes[id].indices.clone();
      indices.sort_unstable();
      CommonPrefix {
        prefix,
        indices,
        suffixes: self.suffixes(id),
      }
    })
  }

  fn suffixes(&self, id: usize) -> Vec<Production> {
    let mut suffixes = BTreeSet::new();
    let mut stack: Vec<(usize, Production)> = vec![(id, vec![])];
    while let Some((id, suffix)) = stack.pop() {
      let node = &self.nodes[id];
      if node.ends > 0 {
        suffixes.insert(if suffix.is_empty() {
          vec![EMPTY.to_owned()]
        } else {
          suffix.clone()
        });
      }
      for (symbol, &child) in &node.children {
        let mut suffix = suffix.clone();
        suffix.push(symbol.clone());
        stack.push((child, suffix));
      }
    }
    suffixes.into_iter().collect()
  }
}
