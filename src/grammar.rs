use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::ops::BitOr;
use std::str::FromStr;
use indexmap::{IndexMap, IndexSet};
use crate::error::{Error, Result};

pub type Symbol = String;

/// Never empty once stored in a grammar, `[EMPTY]` stands for ε.
pub type Production = Vec<Symbol>;

pub const EMPTY: &str = "ε";
pub const EOF: &str = "¥";
pub const DOT: &str = "·";
pub const LOOKAHEAD_SEPARATOR: &str = "﹐";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
  /// declared non-terminals, the first one is the start symbol
  ordering: Vec<Symbol>,
  /// may hold heads missing from `ordering`, e.g. the augmented start symbol
  productions: IndexMap<Symbol, Vec<Production>>,
  terminals: IndexSet<Symbol>,
}

/// Canonical key of a production, used for deduplication.
pub fn production_key(production: &[Symbol]) -> String {
  production.join(" ")
}

pub(crate) fn is_empty_production(production: &[Symbol]) -> bool {
  production.is_empty() || (production.len() == 1 && production[0] == EMPTY)
}

impl Grammar {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn parse(text: &str) -> Result<Self> {
    crate::bnf::parse(text)
  }

  pub fn is_empty(&self) -> bool {
    self.ordering.is_empty()
  }

  pub fn start_symbol(&self) -> Option<&Symbol> {
    self.ordering.first()
  }

  pub fn non_terminals(&self) -> &[Symbol] {
    &self.ordering
  }

  /// Sorted terminals, never containing `EMPTY`.
  pub fn terminals(&self) -> Vec<Symbol> {
    let mut terminals = self.terminals.iter().cloned().collect::<Vec<_>>();
    terminals.sort();
    terminals
  }

  pub fn is_terminal(&self, symbol: &str) -> bool {
    self.terminals.contains(symbol)
  }

  pub fn is_non_terminal(&self, symbol: &str) -> bool {
    self.productions.contains_key(symbol)
  }

  /// Every head, including ones kept out of the ordering.
  pub(crate) fn heads(&self) -> impl Iterator<Item = &Symbol> {
    self.productions.keys()
  }

  pub fn alternatives(&self, head: &str) -> &[Production] {
    self.productions.get(head).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn add_production(
    &mut self,
    head: impl Into<Symbol>,
    production: Production,
  ) {
    let head = head.into();
    let production = if production.is_empty() {
      vec![EMPTY.to_owned()]
    } else {
      production
    };
    if !self.productions.contains_key(&head) {
      self.ordering.push(head.clone());
    }
    self.productions.entry(head).or_default().push(production);
  }

  pub fn add_productions(
    &mut self,
    head: impl Into<Symbol>,
    productions: impl IntoIterator<Item = Production>,
  ) {
    let head = head.into();
    for production in productions {
      self.add_production(head.clone(), production);
    }
  }

  pub(crate) fn set_alternatives(
    &mut self,
    head: &str,
    alternatives: Vec<Production>,
  ) {
    if let Some(slot) = self.productions.get_mut(head) {
      *slot = alternatives;
    }
  }

  /// Recomputes terminals as every right-hand-side symbol that is not a head.
  pub fn init_terminals(&mut self) {
    let mut terminals = IndexSet::new();
    for alternatives in self.productions.values() {
      for symbol in alternatives.iter().flatten() {
        if symbol != EMPTY && !self.productions.contains_key(symbol) {
          terminals.insert(symbol.clone());
        }
      }
    }
    self.terminals = terminals;
  }

  /// Removes repeated alternatives of each head, keeping the first occurrence.
  pub fn deduplicate(&mut self) {
    for alternatives in self.productions.values_mut() {
      let mut keys = HashSet::new();
      alternatives.retain(|production| keys.insert(production_key(production)));
    }
  }

  /// Synthesizes an unused non-terminal derived from `symbol`: `A'`, then
  /// `A'_1`, `A'_2`, ...
  ///
  /// The new symbol is registered with no alternatives. When
  /// `update_ordering` is false it stays out of the public ordering.
  pub fn generate_primed_symbol(
    &mut self,
    symbol: &str,
    update_ordering: bool,
  ) -> Result<Symbol> {
    if !self.productions.contains_key(symbol) {
      return Err(Error::InvalidSymbol(symbol.to_owned()));
    }

    let stem = match prime_stem(symbol) {
      Some(stem) => stem.to_owned(),
      None => {
        let primed = format!("{}'", symbol);
        if !self.is_taken(&primed) {
          self.register(&primed, symbol, symbol, update_ordering);
          return Ok(primed);
        }
        primed
      }
    };

    let mut index = 1;
    loop {
      let candidate = format!("{}_{}", stem, index);
      if !self.is_taken(&candidate) {
        let previous = if index == 1 {
          stem.clone()
        } else {
          format!("{}_{}", stem, index - 1)
        };
        self.register(&candidate, &previous, symbol, update_ordering);
        return Ok(candidate);
      }
      index += 1;
    }
  }

  fn is_taken(&self, symbol: &str) -> bool {
    self.productions.contains_key(symbol) || self.terminals.contains(symbol)
  }

  fn register(
    &mut self,
    symbol: &str,
    after: &str,
    fallback: &str,
    update_ordering: bool,
  ) {
    self.productions.insert(symbol.to_owned(), vec![]);
    if update_ordering {
      let index = self.ordering.iter().position(|s| s == after)
        .or_else(|| self.ordering.iter().position(|s| s == fallback))
        .map_or(self.ordering.len(), |i| i + 1);
      self.ordering.insert(index, symbol.to_owned());
    }
  }
}

/// `A'` for both `A'` and `A'_12`, `None` when there is no trailing prime.
fn prime_stem(symbol: &str) -> Option<&str> {
  if symbol.ends_with('\'') {
    return Some(symbol);
  }
  let pos = symbol.rfind("'_")?;
  let digits = &symbol[pos + 2..];
  if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
    Some(&symbol[..=pos])
  } else {
    None
  }
}

/// Writes `head -> body` lines with heads right-aligned and further
/// alternatives continued by `|`.
pub(crate) fn write_rules(
  f: &mut Formatter,
  rules: &[(&str, Vec<String>)],
) -> fmt::Result {
  let width = rules.iter()
    .map(|(head, _)| head.chars().count())
    .max()
    .unwrap_or(0);
  for (head, bodies) in rules {
    for (i, body) in bodies.iter().enumerate() {
      if i == 0 {
        writeln!(f, "{:>width$} -> {}", head, body, width = width)?;
      } else {
        writeln!(f, "{:>width$}  | {}", "", body, width = width)?;
      }
    }
  }
  Ok(())
}

impl Display for Grammar {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    let rules = self.ordering.iter()
      .map(|head| {
        let bodies = self.alternatives(head).iter()
          .map(|production| production_key(production))
          .collect::<Vec<_>>();
        (head.as_str(), bodies)
      })
      .collect::<Vec<_>>();
    write_rules(f, &rules)
  }
}

impl FromStr for Grammar {
  type Err = Error;

  fn from_str(text: &str) -> Result<Self> {
    Self::parse(text)
  }
}

/// Unions orderings (left first) and concatenates alternatives, then
/// deduplicates.
impl BitOr for Grammar {
  type Output = Grammar;

  fn bitor(mut self, rhs: Grammar) -> Grammar {
    for head in rhs.ordering {
      if !self.ordering.contains(&head) {
        self.ordering.push(head);
      }
    }
    for (head, mut alternatives) in rhs.productions {
      self.productions.entry(head).or_default().append(&mut alternatives);
    }
    self.init_terminals();
    self.deduplicate();
    self
  }
}

#[cfg(test)]
pub(crate) fn symbols(text: &str) -> Production {
  text.split_whitespace().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn add_productions() {
    let mut grammar = Grammar::new();
    grammar.add_production("B", symbols("b"));
    grammar.add_production("A", symbols("a"));
    grammar.add_production("B", symbols("c"));
    grammar.add_production("A", symbols("d"));
    grammar.init_terminals();

    assert_eq!(grammar.to_string(), "B -> b\n   | c\nA -> a\n   | d\n");
    assert_eq!(grammar.non_terminals(), &["B".to_owned(), "A".to_owned()]);
    assert_eq!(grammar.terminals(), symbols("a b c d"));
  }

  #[test]
  fn empty_production_is_stored_as_epsilon() {
    let mut grammar = Grammar::new();
    grammar.add_production("S", vec![]);
    assert_eq!(grammar.alternatives("S"), &[symbols("ε")]);
    assert_eq!(grammar.to_string(), "S -> ε\n");
  }

  #[test]
  fn empty_grammar() {
    let grammar = Grammar::new();
    assert!(grammar.is_empty());
    assert_eq!(grammar.start_symbol(), None);
    assert_eq!(grammar.to_string(), "");
    assert!(grammar.alternatives("S").is_empty());
  }

  #[test]
  fn heads_are_right_aligned() {
    let mut grammar = Grammar::new();
    grammar.add_productions("S", vec![symbols("A a"), symbols("b")]);
    grammar.add_production("Abc", symbols("c"));

    assert_eq!(grammar.to_string(), "  S -> A a
     | b
Abc -> c
");
  }

  #[test]
  fn terminals_skip_epsilon_and_heads() {
    let mut grammar = Grammar::new();
    grammar.add_productions("S", vec![symbols("A a"), symbols("ε")]);
    grammar.add_production("A", symbols("b S"));
    grammar.init_terminals();

    assert_eq!(grammar.terminals(), symbols("a b"));
    assert!(grammar.is_terminal("a"));
    assert!(!grammar.is_terminal("ε"));
    assert!(grammar.is_non_terminal("A"));
  }

  #[test]
  fn deduplicate_keeps_first_occurrence() {
    let mut grammar = Grammar::new();
    grammar.add_productions("S", vec![
      symbols("a b"), symbols("b"), symbols("a b"), symbols("b a"), symbols("b"),
    ]);
    grammar.deduplicate();
    let once = grammar.clone();
    grammar.deduplicate();

    assert_eq!(grammar.alternatives("S"),
      &[symbols("a b"), symbols("b"), symbols("b a")]);
    assert_eq!(grammar, once);
  }

  #[test]
  fn merge() {
    let mut left = Grammar::new();
    left.add_productions("S", vec![symbols("a"), symbols("b")]);
    left.add_production("A", symbols("c"));
    let mut right = Grammar::new();
    right.add_production("B", symbols("d"));
    right.add_productions("S", vec![symbols("b"), symbols("e")]);

    let merged = left | right;

    assert_eq!(merged.to_string(), "\
S -> a
   | b
   | e
A -> c
B -> d
");
    assert_eq!(merged.terminals(), symbols("a b c d e"));
  }

  #[test]
  fn primed_symbols() {
    let mut grammar = Grammar::new();
    grammar.add_production("A", symbols("a"));
    grammar.add_production("B", symbols("b"));

    assert_eq!(grammar.generate_primed_symbol("A", true).unwrap(), "A'");
    assert_eq!(grammar.generate_primed_symbol("A", true).unwrap(), "A'_1");
    assert_eq!(grammar.generate_primed_symbol("A", true).unwrap(), "A'_2");
    assert_eq!(grammar.non_terminals(), &symbols("A A' A'_1 A'_2 B")[..]);
  }

  #[test]
  fn primed_symbol_of_primed_symbol() {
    let mut grammar = Grammar::new();
    for head in &["A", "A'", "A'_1", "A'_2"] {
      grammar.add_production(*head, symbols("a"));
    }
    grammar.add_production("B", symbols("b"));

    assert_eq!(grammar.generate_primed_symbol("A'_1", true).unwrap(), "A'_3");
    assert_eq!(grammar.generate_primed_symbol("A'", true).unwrap(), "A'_4");
    assert_eq!(grammar.non_terminals(),
      &symbols("A A' A'_1 A'_2 A'_3 A'_4 B")[..]);
  }

  #[test]
  fn primed_symbol_without_trailing_prime() {
    let mut grammar = Grammar::new();
    for head in &["A'B", "A'_", "A'_d", "A'_1d"] {
      grammar.add_production(*head, symbols("a"));
    }

    assert_eq!(grammar.generate_primed_symbol("A'B", true).unwrap(), "A'B'");
    assert_eq!(grammar.generate_primed_symbol("A'_", true).unwrap(), "A'_'");
    assert_eq!(grammar.generate_primed_symbol("A'_d", true).unwrap(), "A'_d'");
    assert_eq!(grammar.generate_primed_symbol("A'_1d", true).unwrap(),
      "A'_1d'");
  }

  #[test]
  fn primed_symbol_avoids_terminals() {
    let mut grammar = Grammar::new();
    grammar.add_production("S", symbols("S'"));
    grammar.init_terminals();

    assert_eq!(grammar.generate_primed_symbol("S", true).unwrap(), "S'_1");
    assert_eq!(grammar.non_terminals(), &symbols("S S'_1")[..]);
  }

  #[test]
  fn hidden_primed_symbol() {
    let mut grammar = Grammar::new();
    grammar.add_production("S", symbols("a"));
    let primed = grammar.generate_primed_symbol("S", false).unwrap();
    grammar.add_production(primed.clone(), symbols("S"));

    assert_eq!(primed, "S'");
    assert_eq!(grammar.non_terminals(), &symbols("S")[..]);
    assert!(grammar.is_non_terminal("S'"));
    assert_eq!(grammar.to_string(), "S -> a\n");
  }

  #[test]
  fn primed_symbol_of_unknown_symbol() {
    let mut grammar = Grammar::new();
    grammar.add_production("S", symbols("a"));
    grammar.init_terminals();

    assert_eq!(grammar.generate_primed_symbol("T", true),
      Err(Error::InvalidSymbol("T".to_owned())));
    assert_eq!(grammar.generate_primed_symbol("a", true),
      Err(Error::InvalidSymbol("a".to_owned())));
  }
}
