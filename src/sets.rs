//! compute FIRST, FOLLOW, and NULLABLE sets.

mod token_set;

use indexmap::{IndexMap, IndexSet};
use crate::grammar::*;
use self::token_set::TokenSet;

#[derive(Debug, Clone)]
pub struct FirstAndFollowSet {
  ordering: Vec<Symbol>,
  /// terminals, `EOF` and `EMPTY`, indexed by token id
  tokens: IndexSet<Symbol>,
  first: IndexMap<Symbol, TokenSet>,
  follow: IndexMap<Symbol, TokenSet>,
}

impl Grammar {
  pub fn compute_first_and_follow_set(&self) -> FirstAndFollowSet {
    let mut tokens = self.terminals().into_iter().collect::<IndexSet<_>>();
    tokens.insert(EOF.to_owned());
    tokens.insert(EMPTY.to_owned());

    let mut sets = FirstAndFollowSet {
      ordering: self.non_terminals().to_vec(),
      first: IndexMap::new(),
      follow: IndexMap::new(),
      tokens,
    };
    let num_tokens = sets.tokens.len();
    for (id, token) in sets.tokens.iter().enumerate() {
      sets.first.insert(token.clone(), TokenSet::from_token(num_tokens, id as u32));
    }
    for head in self.heads() {
      sets.first.insert(head.clone(), TokenSet::new(num_tokens));
      sets.follow.insert(head.clone(), TokenSet::new(num_tokens));
    }

    gen_first(self, &mut sets);
    gen_follow(self, &mut sets);
    sets
  }
}

fn gen_first(grammar: &Grammar, sets: &mut FirstAndFollowSet) {
  let empty = sets.token_id(EMPTY);
  let mut iterations = 0;

  loop {
    iterations += 1;
    let mut changed = false;
    for head in grammar.heads() {
      for production in grammar.alternatives(head) {
        let mut buf = sets.new_set();
        if sets.compute_first_for_symbols(&mut buf, production) {
          buf.insert(empty);
        }
        if let Some(first) = sets.first.get_mut(head) {
          changed |= first.union_with(&buf);
        }
      }
    }
    if !changed {
      break;
    }
  }

  log::debug!("FIRST sets converged after {} iterations", iterations);
}

fn gen_follow(grammar: &Grammar, sets: &mut FirstAndFollowSet) {
  let start = match grammar.start_symbol() {
    Some(start) => start,
    None => return,
  };
  let eof = sets.token_id(EOF);
  if let Some(follow) = sets.follow.get_mut(start) {
    follow.insert(eof);
  }
  let mut iterations = 0;

  loop {
    iterations += 1;
    let mut changed = false;
    for head in grammar.heads() {
      for production in grammar.alternatives(head) {
        for (i, symbol) in production.iter().enumerate().rev() {
          if !grammar.is_non_terminal(symbol) {
            continue;
          }
          let mut buf = sets.new_set();
          if sets.compute_first_for_symbols(&mut buf, &production[i + 1..]) {
            if let Some(follow) = sets.follow.get(head) {
              buf.union_with(follow);
            }
          }
          if let Some(follow) = sets.follow.get_mut(symbol) {
            changed |= follow.union_with(&buf);
          }
        }
      }
    }
    if !changed {
      break;
    }
  }

  log::debug!("FOLLOW sets converged after {} iterations", iterations);
}

impl FirstAndFollowSet {
  /// Number of non-terminals.
  pub fn len(&self) -> usize {
    self.ordering.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ordering.is_empty()
  }

  pub fn symbol_at(&self, index: usize) -> Option<&Symbol> {
    self.ordering.get(index)
  }

  pub fn is_nullable(&self, symbol: &str) -> bool {
    let empty = self.token_id(EMPTY);
    self.first.get(symbol).map_or(false, |set| set.contains(empty))
  }

  /// Sorted FIRST set, containing `EMPTY` when the symbol is nullable.
  pub fn first_set(&self, symbol: &str) -> Vec<Symbol> {
    self.first.get(symbol).map_or_else(Vec::new, |set| self.symbols_of(set))
  }

  /// Sorted FOLLOW set, possibly containing `EOF`.
  pub fn follow_set(&self, symbol: &str) -> Vec<Symbol> {
    self.follow.get(symbol).map_or_else(Vec::new, |set| self.symbols_of(set))
  }

  /// Sorted FIRST set of a symbol sequence, containing `EMPTY` when the
  /// whole sequence is nullable.
  pub fn first_of_sequence(&self, symbols: &[Symbol]) -> Vec<Symbol> {
    let mut buf = self.new_set();
    if self.compute_first_for_symbols(&mut buf, symbols) {
      buf.insert(self.token_id(EMPTY));
    }
    self.symbols_of(&buf)
  }

  /// Adds FIRST of `symbols` without `EMPTY` to `result` and returns whether
  /// all of them are nullable.
  fn compute_first_for_symbols(
    &self,
    result: &mut TokenSet,
    symbols: &[Symbol],
  ) -> bool {
    let empty = self.token_id(EMPTY);
    for symbol in symbols {
      let first = match self.first.get(symbol) {
        Some(first) => first,
        None => return false,
      };
      result.union_with(first);
      result.remove(empty);
      if !first.contains(empty) {
        return false;
      }
    }
    true
  }

  fn token_id(&self, token: &str) -> u32 {
    self.tokens.get_index_of(token).unwrap_or(0) as u32
  }

  fn new_set(&self) -> TokenSet {
    TokenSet::new(self.tokens.len())
  }

  fn symbols_of(&self, set: &TokenSet) -> Vec<Symbol> {
    let mut symbols = set.iter()
      .filter_map(|id| self.tokens.get_index(id as usize))
      .cloned()
      .collect::<Vec<_>>();
    symbols.sort();
    symbols
  }
}
