use std::collections::HashSet;
use crate::error::{Error, Result};
use crate::grammar::*;
use super::{restore_empty, strip_empty};

impl Grammar {
  /// Rewrites direct and indirect left recursion following the ordering of
  /// non-terminals.
  ///
  /// Fails when some non-terminal only has left-recursive alternatives. The
  /// heads processed before the failing one stay rewritten.
  ///
  /// A self loop `A -> A` is always dropped, also next to other recursive
  /// alternatives, instead of becoming `A' -> A'`.
  pub fn eliminate_left_recursion(&mut self) -> Result<()> {
    let result = self.eliminate_each_head();
    self.init_terminals();
    result
  }

  fn eliminate_each_head(&mut self) -> Result<()> {
    let heads = self.non_terminals().to_vec();
    let mut eliminated = HashSet::new();

    for head in &heads {
      let (mut recursive, non_recursive) =
        self.split_left_recursive(head, &eliminated);
      eliminated.insert(head.clone());

      if recursive.is_empty() {
        continue;
      }
      if non_recursive.is_empty() {
        log::debug!("left recursion of {} cannot be eliminated", head);
        return Err(Error::UnresolvableRecursion(head.clone()));
      }

      // `A -> A` derives nothing new
      recursive.retain(|production| production.len() > 1);
      if recursive.is_empty() {
        self.set_alternatives(head, non_recursive.into_iter()
          .map(restore_empty)
          .collect());
        continue;
      }

      let primed = self.generate_primed_symbol(head, true)?;
      let alternatives = non_recursive.into_iter()
        .map(|mut production| {
          production.push(primed.clone());
          production
        })
        .collect();
      let mut tails = recursive.into_iter()
        .map(|production| {
          let mut tail = production[1..].to_vec();
          tail.push(primed.clone());
          tail
        })
        .collect::<Vec<_>>();
      tails.push(vec![EMPTY.to_owned()]);

      self.set_alternatives(head, alternatives);
      self.set_alternatives(&primed, tails);
      log::debug!("eliminated left recursion of {} with {}", head, primed);
    }

    Ok(())
  }

  /// Splits the alternatives of `head` into left-recursive and other ones
  /// after substituting leading non-terminals that were already processed.
  /// Returned productions have `ε` stripped.
  fn split_left_recursive(
    &self,
    head: &str,
    eliminated: &HashSet<Symbol>,
  ) -> (Vec<Production>, Vec<Production>) {
    let mut recursive = vec![];
    let mut non_recursive = vec![];
    let mut keys = HashSet::new();
    let mut worklist = self.alternatives(head).iter()
      .rev()
      .map(|production| strip_empty(production))
      .collect::<Vec<_>>();

    while let Some(production) = worklist.pop() {
      match production.first() {
        Some(first) if first == head => {
          if keys.insert(production_key(&production)) {
            recursive.push(production);
          }
        }
        Some(first) if eliminated.contains(first) => {
          for alternative in self.alternatives(first).iter().rev() {
            let mut expanded = strip_empty(alternative);
            expanded.extend_from_slice(&production[1..]);
            worklist.push(expanded);
          }
        }
        _ => {
          if keys.insert(production_key(&production)) {
            non_recursive.push(production);
          }
        }
      }
    }

    (recursive, non_recursive)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn eliminate(text: &str) -> String {
    let mut grammar = Grammar::parse(text).unwrap();
    grammar.eliminate_left_recursion().unwrap();
    grammar.to_string()
  }

  #[test]
  fn indirect_recursion() {
    assert_eq!(eliminate("S -> A a | b  A -> A c | S d | ϵ"), " S -> A a
    | b
 A -> b d A'
    | A'
A' -> c A'
    | a d A'
    | ε
");
  }

  #[test]
  fn nullable_base() {
    assert_eq!(eliminate("S -> S ( S ) S | ε"), " S -> S'
S' -> ( S ) S S'
    | ε
");
  }

  #[test]
  fn several_recursive_alternatives() {
    assert_eq!(eliminate("S -> S + S | S S | ( S ) | S * | a"), " S -> ( S ) S'
    | a S'
S' -> + S S'
    | S S'
    | * S'
    | ε
");
  }

  #[test]
  fn recursion_through_earlier_head() {
    assert_eq!(eliminate("S -> ( L ) | a  L -> L , S | S"), " S -> ( L )
    | a
 L -> ( L ) L'
    | a L'
L' -> , S L'
    | ε
");
  }

  #[test]
  fn primed_symbols_follow_their_base() {
    assert_eq!(eliminate("
      bexpr -> bexpr or bterm | bterm
      bterm -> bterm and bfactor | bfactor
      bfactor -> not bfactor | ( bexpr ) | true | false
    "), "  bexpr -> bterm bexpr'
 bexpr' -> or bterm bexpr'
         | ε
  bterm -> bfactor bterm'
 bterm' -> and bfactor bterm'
         | ε
bfactor -> not bfactor
         | ( bexpr )
         | true
         | false
");
  }

  #[test]
  fn self_loop_is_dropped() {
    assert_eq!(eliminate("S -> S | a | b"), "S -> a\n   | b\n");
  }

  #[test]
  fn self_loop_next_to_recursion() {
    assert_eq!(eliminate("A -> A | A b | c"), " A -> c A'
A' -> b A'
    | ε
");
  }

  #[test]
  fn grammar_without_recursion_is_unchanged() {
    let text = "S -> A a | b  A -> ε | b";
    let mut grammar = Grammar::parse(text).unwrap();
    grammar.eliminate_left_recursion().unwrap();
    assert_eq!(grammar, Grammar::parse(text).unwrap());
  }

  #[test]
  fn only_recursive_alternatives() {
    let mut grammar = Grammar::parse("A -> A a | A b").unwrap();
    let err = grammar.eliminate_left_recursion().unwrap_err();
    assert_eq!(err, Error::UnresolvableRecursion("A".to_owned()));
    assert_eq!(err.to_string(), "Left recursion cannot be eliminated for \"A\".");
  }

  #[test]
  fn mutual_recursion_without_base() {
    let mut grammar = Grammar::parse("A -> B  B -> A").unwrap();
    assert_eq!(grammar.eliminate_left_recursion(),
      Err(Error::UnresolvableRecursion("B".to_owned())));
  }
}
