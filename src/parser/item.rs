use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Display, Formatter};
use std::iter::FromIterator;
use std::ops::BitOr;
use indexmap::IndexMap;
use crate::grammar::*;
use crate::sets::FirstAndFollowSet;

/// A production with a dot marking the parse progress, and for LR(1) items
/// a lookahead terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
  pub head: Symbol,
  pub before: Vec<Symbol>,
  pub after: Vec<Symbol>,
  pub lookahead: Option<Symbol>,
}

impl Item {
  /// Item with the dot at the start. `[ε]` yields the complete item `A -> ·`.
  pub fn new(
    head: impl Into<Symbol>,
    production: &[Symbol],
    lookahead: Option<Symbol>,
  ) -> Self {
    let after = if is_empty_production(production) {
      vec![]
    } else {
      production.to_vec()
    };
    Self {
      head: head.into(),
      before: vec![],
      after,
      lookahead,
    }
  }

  pub fn next_symbol(&self) -> Option<&Symbol> {
    self.after.first()
  }

  pub fn is_complete(&self) -> bool {
    self.after.is_empty()
  }

  /// Moves the dot over the next symbol.
  pub fn advance(&self) -> Self {
    let mut item = self.clone();
    if !item.after.is_empty() {
      let symbol = item.after.remove(0);
      item.before.push(symbol);
    }
    item
  }

  /// The underlying production, `[ε]` for an empty one.
  pub fn production(&self) -> Production {
    let production = self.before.iter()
      .chain(&self.after)
      .cloned()
      .collect::<Vec<_>>();
    if production.is_empty() {
      vec![EMPTY.to_owned()]
    } else {
      production
    }
  }

  /// The item without its lookahead.
  pub fn core(&self) -> Self {
    Self {
      lookahead: None,
      ..self.clone()
    }
  }

  /// Right-hand side as rendered, e.g. `c · C ﹐ d`.
  pub fn body(&self) -> String {
    let mut parts = self.before.iter().map(String::as_str).collect::<Vec<_>>();
    parts.push(DOT);
    parts.extend(self.after.iter().map(String::as_str));
    if let Some(lookahead) = &self.lookahead {
      parts.push(LOOKAHEAD_SEPARATOR);
      parts.push(lookahead);
    }
    parts.join(" ")
  }
}

impl Display for Item {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{} -> {}", self.head, self.body())
  }
}

/// Items grouped by head, heads and items kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSet {
  groups: IndexMap<Symbol, Vec<Item>>,
}

impl ItemSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, item: Item) {
    self.groups.entry(item.head.clone()).or_default().push(item);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Item> {
    self.groups.values().flatten()
  }

  pub fn len(&self) -> usize {
    self.groups.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn contains(&self, item: &Item) -> bool {
    self.groups.get(&item.head).map_or(false, |items| items.contains(item))
  }

  /// Order-insensitive identity of the set.
  pub(crate) fn key(&self) -> String {
    let mut keys = self.iter().map(Item::to_string).collect::<Vec<_>>();
    keys.sort();
    keys.join("\n")
  }

  /// Identity of the set with lookaheads stripped.
  pub(crate) fn core_key(&self) -> String {
    let mut keys = self.iter()
      .map(|item| item.core().to_string())
      .collect::<Vec<_>>();
    keys.sort();
    keys.dedup();
    keys.join("\n")
  }
}

impl FromIterator<Item> for ItemSet {
  fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
    let mut set = Self::new();
    for item in iter {
      set.push(item);
    }
    set
  }
}

/// Merges like grammars do: heads of `self` first, the items of each head
/// concatenated, repeated items dropped.
impl BitOr for ItemSet {
  type Output = ItemSet;

  fn bitor(mut self, rhs: ItemSet) -> ItemSet {
    for (head, items) in rhs.groups {
      let group = self.groups.entry(head).or_default();
      for item in items {
        if !group.contains(&item) {
          group.push(item);
        }
      }
    }
    self
  }
}

impl Display for ItemSet {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    let rules = self.groups.iter()
      .map(|(head, items)| {
        (head.as_str(), items.iter().map(Item::body).collect::<Vec<_>>())
      })
      .collect::<Vec<_>>();
    write_rules(f, &rules)
  }
}

impl Grammar {
  /// LR(0) closure: the items `B -> · γ` reachable from `kernel`, excluding
  /// the kernel itself.
  pub fn compute_closure(&self, kernel: &ItemSet) -> ItemSet {
    let mut seen = kernel.iter().cloned().collect::<HashSet<_>>();
    let mut non_kernel = ItemSet::new();
    let mut queue = kernel.iter().cloned().collect::<VecDeque<_>>();

    while let Some(item) = queue.pop_front() {
      let symbol = match item.next_symbol() {
        Some(symbol) => symbol,
        None => continue,
      };
      for production in self.alternatives(symbol) {
        let new_item = Item::new(symbol.clone(), production, None);
        if seen.insert(new_item.clone()) {
          non_kernel.push(new_item.clone());
          queue.push_back(new_item);
        }
      }
    }

    non_kernel
  }

  /// LR(1) closure: for `[A -> α · B β, a]` adds `[B -> · γ, b]` for every
  /// `b` in FIRST(βa).
  pub fn compute_lr1_closure(
    &self,
    kernel: &ItemSet,
    sets: &FirstAndFollowSet,
  ) -> ItemSet {
    let mut seen = kernel.iter().cloned().collect::<HashSet<_>>();
    let mut non_kernel = ItemSet::new();
    let mut worklist = kernel.iter().cloned().collect::<Vec<_>>();

    while let Some(item) = worklist.pop() {
      let symbol = match item.next_symbol() {
        Some(symbol) if self.is_non_terminal(symbol) => symbol,
        _ => continue,
      };
      let lookaheads = lookaheads_after(&item, sets);
      for production in self.alternatives(symbol) {
        for lookahead in &lookaheads {
          let new_item = Item::new(symbol.clone(), production, Some(lookahead.clone()));
          if seen.insert(new_item.clone()) {
            non_kernel.push(new_item.clone());
            worklist.push(new_item);
          }
        }
      }
    }

    non_kernel
  }
}

/// FIRST(βa) for `[A -> α · B β, a]`, sorted.
fn lookaheads_after(item: &Item, sets: &FirstAndFollowSet) -> Vec<Symbol> {
  let mut lookaheads = sets.first_of_sequence(&item.after[1..]);
  if let Some(pos) = lookaheads.iter().position(|symbol| symbol == EMPTY) {
    lookaheads.remove(pos);
    let lookahead = item.lookahead.clone().unwrap_or_else(|| EOF.to_owned());
    if !lookaheads.contains(&lookahead) {
      lookaheads.push(lookahead);
      lookaheads.sort();
    }
  }
  lookaheads
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn kernel(head: &str, production: &str, dot: usize) -> ItemSet {
    let mut item = Item::new(head, &symbols(production), None);
    for _ in 0..dot {
      item = item.advance();
    }
    std::iter::once(item).collect()
  }

  #[test]
  fn item_rendering() {
    let item = Item::new("C", &symbols("c C"), Some("d".to_owned()));
    assert_eq!(item.to_string(), "C -> · c C ﹐ d");
    assert_eq!(item.advance().advance().to_string(), "C -> c C · ﹐ d");
    assert_eq!(Item::new("A", &symbols("ε"), None).to_string(), "A -> ·");
    assert_eq!(Item::new("A", &symbols("ε"), None).production(), symbols("ε"));
    assert!(item.advance().advance().is_complete());
  }

  #[test]
  fn closure_of_start_item() {
    let grammar = Grammar::parse("
      E' -> E
      E -> E + T | T
      T -> T * F | F
      F -> ( E ) | id
    ").unwrap();
    let closure = grammar.compute_closure(&kernel("E'", "E", 0));
    assert_eq!(closure.to_string(), "\
E -> · E + T
   | · T
T -> · T * F
   | · F
F -> · ( E )
   | · id
");
  }

  #[test]
  fn closure_chain() {
    let grammar = Grammar::parse("S' → S  S → A  A → B  B → c").unwrap();
    let closure = grammar.compute_closure(&kernel("S'", "S", 0));
    assert_eq!(closure.to_string(), "S -> · A\nA -> · B\nB -> · c\n");
  }

  #[test]
  fn closure_after_dot() {
    let grammar = Grammar::parse("S' → S  S → a A  A → b").unwrap();
    let closure = grammar.compute_closure(&kernel("S", "a A", 1));
    assert_eq!(closure.to_string(), "A -> · b\n");
  }

  #[test]
  fn closure_skips_kernel_items() {
    let grammar = Grammar::parse("E' → E  E → E + T  E → T  T → id").unwrap();
    let closure = grammar.compute_closure(&kernel("E", "E + T", 0));
    assert_eq!(closure.to_string(), "E -> · T\nT -> · id\n");
  }

  #[test]
  fn closure_groups_by_head() {
    let grammar = Grammar::parse("S → A  A → B | C  B → A  C → d").unwrap();
    let closure = grammar.compute_closure(&kernel("S", "A", 0));
    assert_eq!(closure.to_string(), "\
A -> · B
   | · C
B -> · A
C -> · d
");
  }

  #[test]
  fn empty_closure() {
    let closure = Grammar::new().compute_closure(&ItemSet::new());
    assert_eq!(closure.to_string(), "");
  }

  #[test]
  fn lr1_closure() {
    let grammar = Grammar::parse("S' -> S  S -> C C  C -> c C | d").unwrap();
    let sets = grammar.compute_first_and_follow_set();
    let mut start = Item::new("S'", &symbols("S"), Some(EOF.to_owned()));
    let closure = grammar.compute_lr1_closure(
      &std::iter::once(start.clone()).collect(), &sets);
    assert_eq!(closure.to_string(), "\
S -> · C C ﹐ ¥
C -> · c C ﹐ c
   | · c C ﹐ d
   | · d ﹐ c
   | · d ﹐ d
");

    start = Item::new("S", &symbols("C C"), Some(EOF.to_owned())).advance();
    let closure = grammar.compute_lr1_closure(
      &std::iter::once(start).collect(), &sets);
    assert_eq!(closure.to_string(), "C -> · c C ﹐ ¥\n   | · d ﹐ ¥\n");
  }

  #[test]
  fn merge_keeps_head_order() {
    let kernel = kernel("F", "( E )", 1);
    let grammar = Grammar::parse("F -> ( E ) | id  E -> F").unwrap();
    let merged = kernel.clone() | grammar.compute_closure(&kernel);
    assert_eq!(merged.to_string(), "\
F -> ( · E )
   | · ( E )
   | · id
E -> · F
");
    assert_eq!(merged.len(), 4);
    assert_eq!(merged.clone() | kernel, merged);
  }
}
