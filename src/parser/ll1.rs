use std::fmt::{self, Display, Formatter};
use indexmap::{IndexMap, IndexSet};
use crate::grammar::*;
use super::tree::ParseTree;

/// Predictive parsing table indexed by non-terminal and terminal.
///
/// Rows and columns keep their registration order. A cell holding more than
/// one production is a conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ll1Table {
  non_terminals: IndexSet<Symbol>,
  terminals: IndexSet<Symbol>,
  entries: IndexMap<(Symbol, Symbol), Vec<Production>>,
}

impl Ll1Table {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_non_terminal(&mut self, symbol: &str) {
    self.non_terminals.insert(symbol.to_owned());
  }

  pub fn add_terminal(&mut self, symbol: &str) {
    self.terminals.insert(symbol.to_owned());
  }

  /// Adds `head -> production` to the cell unless it is already there.
  pub fn add_entry(&mut self, head: &str, terminal: &str, production: Production) {
    self.add_non_terminal(head);
    self.add_terminal(terminal);
    let cell = self.entries
      .entry((head.to_owned(), terminal.to_owned()))
      .or_default();
    if !cell.contains(&production) {
      cell.push(production);
    }
  }

  pub fn non_terminals(&self) -> impl Iterator<Item = &Symbol> {
    self.non_terminals.iter()
  }

  pub fn terminals(&self) -> impl Iterator<Item = &Symbol> {
    self.terminals.iter()
  }

  pub fn entries(&self, head: &str, terminal: &str) -> &[Production] {
    self.entries.get(&(head.to_owned(), terminal.to_owned()))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// Productions of a cell rendered as `A -> α` and joined by ` / `.
  pub fn cell(&self, head: &str, terminal: &str) -> String {
    join_productions(head, self.entries(head, terminal))
  }

  pub fn has_conflict(&self) -> bool {
    self.entries.values().any(|cell| cell.len() > 1)
  }

  pub fn has_conflict_at(&self, head: &str, terminal: &str) -> bool {
    self.entries(head, terminal).len() > 1
  }

  /// Runs the predictive driver over whitespace separated tokens. The stack
  /// starts as `EOF` below the first non-terminal.
  pub fn parse(&self, input: &str) -> LlTrace {
    let mut inputs = input.split_whitespace()
      .map(str::to_owned)
      .collect::<Vec<_>>();
    inputs.push(EOF.to_owned());

    let mut trace = LlTrace::default();
    let mut tree = ParseTree::default();
    // each symbol is paired with its tree node
    let mut stack: Vec<(Symbol, Option<usize>)> = vec![(EOF.to_owned(), None)];
    if let Some(start) = self.non_terminals.first() {
      let root = tree.add_leaf(start);
      tree.set_root(root);
      stack.push((start.clone(), Some(root)));
    }
    let mut pos = 0;

    while let (Some((top, node)), Some(symbol)) = (stack.last().cloned(), inputs.get(pos)) {
      let shown = stack.iter().map(|(symbol, _)| symbol.as_str()).collect::<Vec<_>>();

      if top == EOF && symbol == EOF {
        trace.push(&shown, &inputs[pos..], "accept".to_owned());
        if !tree.is_empty() {
          trace.tree = Some(tree);
        }
        break;
      }

      if !self.non_terminals.contains(&top) {
        if &top == symbol {
          trace.push(&shown, &inputs[pos..], format!("match {}", symbol));
          stack.pop();
          pos += 1;
          continue;
        }
        trace.push(&shown, &inputs[pos..], format!("error: expected {}", top));
        break;
      }

      if !self.terminals.contains(symbol) {
        trace.push(&shown, &inputs[pos..], "error: unexpected symbol".to_owned());
        break;
      }
      let cell = self.entries(&top, symbol);
      let production = match cell {
        [] => {
          trace.push(&shown, &inputs[pos..], "error: no rule".to_owned());
          break;
        }
        [production] => production,
        _ => {
          let action = format!("conflict: {}", join_productions(&top, cell));
          trace.push(&shown, &inputs[pos..], action);
          break;
        }
      };
      trace.push(&shown, &inputs[pos..],
        format!("{} -> {}", top, production_key(production)));

      stack.pop();
      let body = if is_empty_production(production) {
        &[][..]
      } else {
        production.as_slice()
      };
      let children = body.iter().map(|symbol| tree.add_leaf(symbol)).collect::<Vec<_>>();
      if let Some(node) = node {
        tree.expand(node, production.clone(), children.clone());
      }
      for (symbol, &child) in body.iter().zip(&children).rev() {
        stack.push((symbol.clone(), Some(child)));
      }
    }

    log::trace!("LL(1) parse finished after {} steps", trace.steps.len());
    trace
  }
}

fn join_productions(head: &str, productions: &[Production]) -> String {
  productions.iter()
    .map(|production| format!("{} -> {}", head, production_key(production)))
    .collect::<Vec<_>>()
    .join(" / ")
}

/// Markdown table with a row per non-terminal and a column per terminal.
impl Display for Ll1Table {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "| |")?;
    for terminal in &self.terminals {
      write!(f, " {} |", terminal)?;
    }
    write!(f, "\n|:-:|")?;
    for _ in &self.terminals {
      write!(f, ":-:|")?;
    }
    writeln!(f)?;

    for head in &self.non_terminals {
      write!(f, "| {} |", head)?;
      for terminal in &self.terminals {
        write!(f, " {} |", self.cell(head, terminal))?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlStep {
  /// bottom to top
  pub stack: Vec<Symbol>,
  pub inputs: Vec<Symbol>,
  pub action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlTrace {
  pub steps: Vec<LlStep>,
  pub tree: Option<ParseTree>,
}

impl LlTrace {
  pub fn is_accepted(&self) -> bool {
    self.steps.last().map_or(false, |step| step.action == "accept")
  }

  fn push(&mut self, stack: &[&str], inputs: &[Symbol], action: String) {
    self.steps.push(LlStep {
      stack: stack.iter().map(|&symbol| symbol.to_owned()).collect(),
      inputs: inputs.to_vec(),
      action,
    });
  }
}

impl Display for LlTrace {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    writeln!(f, "| Stack | Input | Action |")?;
    writeln!(f, "|:-:|:-:|:-:|")?;
    for step in &self.steps {
      writeln!(f, "| {} | {} | {} |",
        step.stack.join(" "), step.inputs.join(" "), step.action)?;
    }
    Ok(())
  }
}

impl Grammar {
  /// Fills `M[A, a]` with `A -> α` for every `a` in FIRST(α), and for every
  /// `b` in FOLLOW(A) when α is nullable. Columns are the sorted terminals
  /// followed by `EOF`; there is no `ε` column since `ε` is never a terminal.
  pub fn compute_ll1_table(&self) -> Ll1Table {
    let sets = self.compute_first_and_follow_set();
    let mut table = Ll1Table::new();
    for head in self.non_terminals() {
      table.add_non_terminal(head);
    }
    for terminal in self.terminals() {
      table.add_terminal(&terminal);
    }
    table.add_terminal(EOF);

    for head in self.non_terminals() {
      for production in self.alternatives(head) {
        let first = sets.first_of_sequence(production);
        let mut nullable = false;
        for symbol in first {
          if symbol == EMPTY {
            nullable = true;
          } else {
            table.add_entry(head, &symbol, production.clone());
          }
        }
        if nullable {
          for symbol in sets.follow_set(head) {
            table.add_entry(head, &symbol, production.clone());
          }
        }
      }
    }

    log::debug!("LL(1) table has {} rows and {} columns",
      table.non_terminals.len(), table.terminals.len());
    table
  }
}
