use std::fmt::{self, Display, Formatter};
use crate::grammar::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
  pub label: Symbol,
  /// `None` for terminals
  pub production: Option<Production>,
  pub children: Vec<usize>,
}

/// Parse tree stored as an arena of nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseTree {
  nodes: Vec<TreeNode>,
  root: usize,
}

impl ParseTree {
  pub fn root(&self) -> Option<&TreeNode> {
    self.nodes.get(self.root)
  }

  pub fn node(&self, id: usize) -> Option<&TreeNode> {
    self.nodes.get(id)
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub(crate) fn add_leaf(&mut self, label: &str) -> usize {
    self.add_node(label, None, vec![])
  }

  pub(crate) fn add_node(
    &mut self,
    label: &str,
    production: Option<Production>,
    children: Vec<usize>,
  ) -> usize {
    self.nodes.push(TreeNode {
      label: label.to_owned(),
      production,
      children,
    });
    self.nodes.len() - 1
  }

  pub(crate) fn expand(
    &mut self,
    id: usize,
    production: Production,
    children: Vec<usize>,
  ) {
    if let Some(node) = self.nodes.get_mut(id) {
      node.production = Some(production);
      node.children = children;
    }
  }

  pub(crate) fn set_root(&mut self, root: usize) {
    self.root = root;
  }
}

/// One node per line, children indented by two spaces.
impl Display for ParseTree {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    if self.nodes.is_empty() {
      return Ok(());
    }
    let mut stack = vec![(self.root, 0)];
    while let Some((id, depth)) = stack.pop() {
      let node = match self.nodes.get(id) {
        Some(node) => node,
        None => continue,
      };
      write!(f, "{:width$}{}", "", node.label, width = depth * 2)?;
      if let Some(production) = &node.production {
        write!(f, " -> {}", production_key(production))?;
      }
      writeln!(f)?;
      for &child in node.children.iter().rev() {
        stack.push((child, depth + 1));
      }
    }
    Ok(())
  }
}
