use std::collections::{HashMap, HashSet};
use crate::error::Result;
use crate::grammar::*;
use super::trie::{CommonPrefix, ProductionTrie};
use super::{restore_empty, strip_empty};

/// A fully expanded alternative and the index of the alternative it
/// originates from.
type Leaf = (Production, usize);

/// An alternative with its leading non-terminal substituted. `parent` is the
/// expansion it was derived from, roots are the original alternatives.
struct Expansion {
  symbols: Production,
  parent: Option<usize>,
  substituted: Option<Symbol>,
}

impl Grammar {
  /// Factors common prefixes out of alternatives until nothing changes.
  ///
  /// With `expand`, alternatives are also compared after substituting their
  /// leading non-terminals, so `A -> id | B` with `B -> id b` is factored
  /// too.
  pub fn left_factoring(&mut self, expand: bool) -> Result<()> {
    let heads = self.non_terminals().to_vec();
    let mut introduced = HashSet::new();

    loop {
      let mut progress = false;
      for head in &heads {
        while self.factor_once(head, expand, &mut introduced)? {
          progress = true;
        }
      }
      if !progress {
        break;
      }
    }

    self.init_terminals();
    Ok(())
  }

  fn factor_once(
    &mut self,
    head: &str,
    expand: bool,
    introduced: &mut HashSet<Symbol>,
  ) -> Result<bool> {
    let alternatives = self.alternatives(head).to_vec();

    let leaves = alternatives.iter()
      .enumerate()
      .map(|(i, production)| (strip_empty(production), i))
      .collect::<Vec<_>>();
    let mut found = common_prefix(&leaves).map(|common| (common, leaves));
    if found.is_none() && expand {
      let blocked = self.left_cyclic(head);
      let leaves = self.expand_alternatives(head, &alternatives, introduced, &blocked);
      found = common_prefix(&leaves).map(|common| (common, leaves));
    }
    let (common, leaves) = match found {
      Some(found) => found,
      None => return Ok(false),
    };

    let removed = common.indices.iter().copied().collect::<HashSet<_>>();
    let mut rewritten = alternatives.into_iter()
      .enumerate()
      .filter(|(i, _)| !removed.contains(i))
      .map(|(_, production)| production)
      .collect::<Vec<_>>();
    for (leaf, origin) in leaves {
      if removed.contains(&origin) && !leaf.starts_with(&common.prefix) {
        let production = restore_empty(leaf);
        if !rewritten.contains(&production) {
          rewritten.push(production);
        }
      }
    }

    let primed = self.generate_primed_symbol(head, true)?;
    let mut factored = common.prefix;
    factored.push(primed.clone());
    rewritten.push(factored);

    self.set_alternatives(head, rewritten);
    self.set_alternatives(&primed, common.suffixes);
    log::debug!("factored {} into {}", head, primed);
    introduced.insert(primed);
    Ok(true)
  }

  /// Non-terminals that can derive a form starting with `head` or with
  /// themselves, looking through nullable prefixes. Substituting them would
  /// feed the factored alternatives back into the next pass.
  fn left_cyclic(&self, head: &str) -> HashSet<Symbol> {
    let sets = self.compute_first_and_follow_set();
    let mut reach = self.heads()
      .map(|non_terminal| {
        let mut leading = HashSet::new();
        for production in self.alternatives(non_terminal) {
          for symbol in strip_empty(production) {
            let nullable = sets.is_nullable(&symbol);
            if self.is_non_terminal(&symbol) {
              leading.insert(symbol);
            }
            if !nullable {
              break;
            }
          }
        }
        (non_terminal.clone(), leading)
      })
      .collect::<HashMap<_, _>>();

    let symbols = reach.keys().cloned().collect::<Vec<_>>();
    let mut changed = true;
    while changed {
      changed = false;
      for symbol in &symbols {
        let targets = reach.get(symbol).cloned().unwrap_or_default();
        let mut more = HashSet::new();
        for target in &targets {
          if let Some(next) = reach.get(target) {
            more.extend(next.iter().filter(|s| !targets.contains(*s)).cloned());
          }
        }
        if let Some(leading) = reach.get_mut(symbol) {
          if !more.is_empty() {
            leading.extend(more);
            changed = true;
          }
        }
      }
    }

    symbols.into_iter()
      .filter(|symbol| {
        reach.get(symbol)
          .map_or(false, |leading| leading.contains(head) || leading.contains(symbol))
      })
      .collect()
  }

  /// Substitutes leading non-terminals until every alternative starts with a
  /// terminal, the head itself, an introduced or blocked symbol, or a symbol
  /// already being substituted on the same path.
  fn expand_alternatives(
    &self,
    head: &str,
    alternatives: &[Production],
    introduced: &HashSet<Symbol>,
    blocked: &HashSet<Symbol>,
  ) -> Vec<Leaf> {
    let mut expansions = alternatives.iter()
      .map(|production| Expansion {
        symbols: strip_empty(production),
        parent: None,
        substituted: None,
      })
      .collect::<Vec<_>>();
    let mut worklist = (0..expansions.len()).rev().collect::<Vec<_>>();
    let mut leaves = vec![];

    while let Some(id) = worklist.pop() {
      let leading = expansions[id].symbols.first()
        .filter(|symbol| {
          self.is_non_terminal(symbol)
            && *symbol != head
            && !introduced.contains(*symbol)
            && !blocked.contains(*symbol)
            && !is_substituted(&expansions, id, symbol)
        })
        .cloned();

      let symbol = match leading {
        Some(symbol) => symbol,
        None => {
          leaves.push((expansions[id].symbols.clone(), origin(&expansions, id)));
          continue;
        }
      };

      for alternative in self.alternatives(&symbol).iter().rev() {
        let mut symbols = strip_empty(alternative);
        symbols.extend_from_slice(&expansions[id].symbols[1..]);
        expansions.push(Expansion {
          symbols,
          parent: Some(id),
          substituted: Some(symbol.clone()),
        });
        worklist.push(expansions.len() - 1);
      }
    }

    leaves
  }
}

fn common_prefix(leaves: &[Leaf]) -> Option<CommonPrefix> {
  let mut trie = ProductionTrie::new();
  for (production, origin) in leaves {
    trie.insert(production, *origin);
  }
  trie.longest_common_prefix()
}

fn origin(expansions: &[Expansion], mut id: usize) -> usize {
  while let Some(parent) = expansions[id].parent {
    id = parent;
  }
  id
}

fn is_substituted(expansions: &[Expansion], mut id: usize, symbol: &str) -> bool {
  loop {
    let expansion = &expansions[id];
    if expansion.substituted.as_deref() == Some(symbol) {
      return true;
    }
    match expansion.parent {
      Some(parent) => id = parent,
      None => return false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn factor(text: &str) -> String {
    let mut grammar = Grammar::parse(text).unwrap();
    grammar.left_factoring(true).unwrap();
    grammar.to_string()
  }

  fn assert_unchanged(text: &str) {
    let grammar = Grammar::parse(text).unwrap();
    assert_eq!(factor(text), grammar.to_string());
  }

  #[test]
  fn dangling_else() {
    assert_eq!(factor("S -> i E t S | i E t S e S | a  E -> b"), " S -> a
    | i E t S S'
S' -> e S
    | ε
 E -> b
");
  }

  #[test]
  fn longest_prefix() {
    assert_eq!(factor("S -> S S + | S S * | a"), " S -> a
    | S S S'
S' -> *
    | +
");
  }

  #[test]
  fn prefix_covering_a_whole_alternative() {
    assert_eq!(factor("S -> 0 S 1 | 0 1"), " S -> 0 S'
S' -> 1
    | S 1
");
  }

  #[test]
  fn several_alternatives_share_a_prefix() {
    assert_eq!(factor("S -> ( S ) | a | S * | S + S | S S"), " S -> ( S )
    | a
    | S S'
S' -> *
    | + S
    | S
");
  }

  #[test]
  fn prefix_behind_a_non_terminal() {
    assert_eq!(factor("A -> id | B | a  B -> id b"), " A -> a
    | id A'
A' -> b
    | ε
 B -> id b
");
  }

  #[test]
  fn expansion_is_optional() {
    let mut grammar = Grammar::parse("A -> id | B | a  B -> id b").unwrap();
    grammar.left_factoring(false).unwrap();
    assert_eq!(grammar.to_string(), "A -> id\n   | B\n   | a\nB -> id b\n");
  }

  #[test]
  fn common_non_terminal_prefix() {
    assert_eq!(factor("S -> A c | A d\nA -> a b"), " S -> A S'
S' -> c
    | d
 A -> a b
");
  }

  #[test]
  fn identical_expansions_are_not_factored() {
    assert_unchanged("S -> a b | A  A -> a b");
    assert_unchanged("S -> a b c | A c  A -> a b");
  }

  #[test]
  fn chained_expansion() {
    assert_eq!(factor("A->id|B|a B->C C->D D->id b"), " A -> a
    | id A'
A' -> b
    | ε
 B -> C
 C -> D
 D -> id b
");
  }

  #[test]
  fn mutual_left_recursion_terminates() {
    let text = "S -> A a | A b | a  A -> a | S";
    let expected = " S -> a
    | A S'
S' -> a
    | b
 A -> a
    | S
";
    assert_eq!(factor(text), expected);

    let mut grammar = Grammar::parse(text).unwrap();
    grammar.left_factoring(false).unwrap();
    assert_eq!(grammar.to_string(), expected);
  }

  #[test]
  fn left_recursive_symbols_are_not_substituted() {
    let grammar = Grammar::parse("S -> A a | b  A -> B c | S  B -> B d | e").unwrap();
    let blocked = grammar.left_cyclic("S");
    assert!(blocked.contains("A"));
    assert!(blocked.contains("B"));
    assert!(!blocked.contains("b"));

    let grammar = Grammar::parse("S -> A | B  A -> a A | a  B -> a B | b").unwrap();
    assert!(grammar.left_cyclic("S").is_empty());
  }

  #[test]
  fn grammars_without_common_prefixes() {
    assert_unchanged("S -> + S S | * S S | a");
    assert_unchanged("S -> S ( S ) S | ε");
    assert_unchanged("S -> a S b S | b S a S | ε");
    assert_unchanged("S -> ( L ) | a  L -> L , S | S");
    assert_unchanged("
      bexpr -> bexpr or bterm | bterm
      bterm -> bterm and bfactor | bfactor
      bfactor -> not bfactor | ( bexpr ) | true | false
    ");
  }

  #[test]
  fn second_run_is_a_no_op() {
    let mut grammar = Grammar::parse("S -> i E t S | i E t S e S | a  E -> b")
      .unwrap();
    grammar.left_factoring(true).unwrap();
    let once = grammar.clone();
    grammar.left_factoring(true).unwrap();
    assert_eq!(grammar, once);
  }
}
