use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Formatter};
use std::iter;
use indexmap::IndexSet;
use crate::error::{Error, Result};
use crate::grammar::*;
use super::item::{Item, ItemSet};

/// A state of an LR automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  pub label: String,
  pub accept: bool,
  pub kernel: ItemSet,
  /// items added by closure
  pub non_kernel: ItemSet,
}

impl Node {
  fn new(index: usize, kernel: ItemSet, non_kernel: ItemSet) -> Self {
    Self {
      label: format!("I{}", subscript(index)),
      accept: false,
      kernel,
      non_kernel,
    }
  }

  fn key(&self) -> String {
    format!("{}\n---\n{}", self.kernel.key(), self.non_kernel.key())
  }

  fn core_key(&self) -> String {
    format!("{}\n---\n{}", self.kernel.core_key(), self.non_kernel.core_key())
  }

  /// Kernel and non-kernel items merged, kernel heads first.
  pub fn items(&self) -> ItemSet {
    self.kernel.clone() | self.non_kernel.clone()
  }
}

impl Display for Node {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}\n===\n{}---\n{}", self.label, self.kernel, self.non_kernel)
  }
}

fn subscript(index: usize) -> String {
  const DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];
  index.to_string()
    .bytes()
    .map(|b| DIGITS[(b - b'0') as usize])
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
  pub from: usize,
  pub to: usize,
  pub symbol: Symbol,
}

/// Nodes and edges addressed by index. Nodes are only appended, and a node
/// whose item sets are already present is not added twice.
#[derive(Debug, Clone, Default)]
pub struct Automaton {
  nodes: Vec<Node>,
  edges: Vec<Edge>,
  /// node key -> index
  keys: HashMap<String, usize>,
}

impl Automaton {
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  pub fn edges_to_string(&self) -> String {
    self.edges.iter()
      .map(|edge| format!("{} -- {} --> {}\n", edge.from, edge.symbol, edge.to))
      .collect()
  }

  /// Returns the index of the node with these item sets, adding it if new.
  fn add_node(&mut self, kernel: ItemSet, non_kernel: ItemSet) -> usize {
    let node = Node::new(self.nodes.len(), kernel, non_kernel);
    let key = node.key();
    if let Some(&index) = self.keys.get(&key) {
      return index;
    }
    self.keys.insert(key, self.nodes.len());
    self.nodes.push(node);
    self.nodes.len() - 1
  }

  fn add_edge(&mut self, from: usize, to: usize, symbol: Symbol) {
    self.edges.push(Edge {
      from,
      to,
      symbol,
    });
  }
}

impl Grammar {
  pub fn compute_lr0_automaton(&self) -> Result<Automaton> {
    let (augmented, start) = self.augment()?;
    let automaton = build_automaton(start, |kernel| augmented.compute_closure(kernel));
    log::debug!("LR(0) automaton has {} states and {} edges",
      automaton.len(), automaton.edges.len());
    Ok(automaton)
  }

  /// SLR(1) shares the LR(0) automaton and differs in its table.
  pub fn compute_slr1_automaton(&self) -> Result<Automaton> {
    self.compute_lr0_automaton()
  }

  pub fn compute_lr1_automaton(&self) -> Result<Automaton> {
    let (augmented, mut start) = self.augment()?;
    start.lookahead = Some(EOF.to_owned());
    let sets = augmented.compute_first_and_follow_set();
    let automaton = build_automaton(start, |kernel| {
      augmented.compute_lr1_closure(kernel, &sets)
    });
    log::debug!("LR(1) automaton has {} states and {} edges",
      automaton.len(), automaton.edges.len());
    Ok(automaton)
  }

  /// Merges the LR(1) states sharing the same core. Merged states keep the
  /// index order of their first LR(1) state.
  pub fn compute_lalr1_automaton(&self) -> Result<Automaton> {
    let lr1 = self.compute_lr1_automaton()?;
    let mut merged = Automaton::default();
    let mut cores = HashMap::new();
    let mut mapping = Vec::with_capacity(lr1.len());

    for node in &lr1.nodes {
      let core = node.core_key();
      let index = match cores.get(&core) {
        Some(&index) => {
          let target: &mut Node = &mut merged.nodes[index];
          target.kernel = target.kernel.clone() | node.kernel.clone();
          target.non_kernel = target.non_kernel.clone() | node.non_kernel.clone();
          target.accept |= node.accept;
          index
        }
        None => {
          let index = merged.add_node(node.kernel.clone(), node.non_kernel.clone());
          merged.nodes[index].accept = node.accept;
          cores.insert(core, index);
          index
        }
      };
      mapping.push(index);
    }

    let mut seen = HashSet::new();
    for edge in &lr1.edges {
      let remapped = Edge {
        from: mapping[edge.from],
        to: mapping[edge.to],
        symbol: edge.symbol.clone(),
      };
      if seen.insert(remapped.clone()) {
        merged.edges.push(remapped);
      }
    }

    log::debug!("LALR(1) automaton merged {} LR(1) states into {}",
      lr1.len(), merged.len());
    Ok(merged)
  }

  /// Clones the grammar with the extra production `S' -> S`, where `S'` is
  /// kept out of the ordering. Returns the item `S' -> · S`.
  pub(crate) fn augment(&self) -> Result<(Grammar, Item)> {
    let start = self.start_symbol().ok_or(Error::NoStartSymbol)?;
    let mut augmented = self.clone();
    let primed = augmented.generate_primed_symbol(start, false)?;
    augmented.add_production(primed.clone(), vec![start.clone()]);
    augmented.init_terminals();
    let item = Item::new(primed, &[start.clone()], None);
    Ok((augmented, item))
  }
}

/// Breadth-first construction of the canonical collection from `start`.
fn build_automaton(
  start: Item,
  closure: impl Fn(&ItemSet) -> ItemSet,
) -> Automaton {
  let accept_head = start.head.clone();
  let mut automaton = Automaton::default();
  let kernel = iter::once(start).collect::<ItemSet>();
  let non_kernel = closure(&kernel);
  automaton.add_node(kernel, non_kernel);

  let mut index = 0;
  while index < automaton.len() {
    let items = automaton.nodes[index].items();
    let mut symbols = IndexSet::new();
    for item in items.iter() {
      match item.next_symbol() {
        Some(symbol) => {
          symbols.insert(symbol.clone());
        }
        None if item.head == accept_head => automaton.nodes[index].accept = true,
        None => {}
      }
    }

    for symbol in symbols {
      let kernel = items.iter()
        .filter(|item| item.next_symbol() == Some(&symbol))
        .map(Item::advance)
        .collect::<ItemSet>();
      let non_kernel = closure(&kernel);
      let to = automaton.add_node(kernel, non_kernel);
      automaton.add_edge(index, to, symbol);
    }
    log::trace!("expanded state {} of {}", index, automaton.len());
    index += 1;
  }

  automaton
}
