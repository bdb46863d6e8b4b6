//! Grammar rewrites that keep the generated language: left-recursion
//! elimination and left factoring.

mod left_factoring;
mod left_recursion;
pub mod trie;

use crate::grammar::*;

/// `[ε]` becomes the empty sequence so that it can be spliced into other
/// productions.
fn strip_empty(production: &[Symbol]) -> Production {
  if is_empty_production(production) {
    vec![]
  } else {
    production.to_vec()
  }
}

/// The inverse of `strip_empty`.
fn restore_empty(production: Production) -> Production {
  if production.is_empty() {
    vec![EMPTY.to_owned()]
  } else {
    production
  }
}
