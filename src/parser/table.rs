use std::fmt::{self, Display, Formatter};
use indexmap::IndexMap;
use crate::grammar::*;
use super::automaton::Automaton;
use super::item::Item;
use super::tree::ParseTree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Shift(usize),
  Reduce(Symbol, Production),
  Accept,
}

impl Display for Action {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Action::Shift(state) => write!(f, "shift {}", state),
      Action::Reduce(head, production) => {
        write!(f, "reduce {} -> {}", head, production_key(production))
      }
      Action::Accept => write!(f, "accept"),
    }
  }
}

/// ACTION and GOTO of an LR parser. A cell holding more than one action is a
/// conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionGotoTable {
  /// terminal columns, `EOF` last
  terminals: Vec<Symbol>,
  non_terminals: Vec<Symbol>,
  actions: Vec<IndexMap<Symbol, Vec<Action>>>,
  gotos: Vec<IndexMap<Symbol, usize>>,
}

impl ActionGotoTable {
  pub fn new(
    num_states: usize,
    terminals: &[Symbol],
    non_terminals: &[Symbol],
  ) -> Self {
    let mut columns = terminals.to_vec();
    columns.push(EOF.to_owned());
    Self {
      terminals: columns,
      non_terminals: non_terminals.to_vec(),
      actions: vec![IndexMap::new(); num_states],
      gotos: vec![IndexMap::new(); num_states],
    }
  }

  pub fn len(&self) -> usize {
    self.actions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.actions.is_empty()
  }

  /// Appends an action to a cell unless the cell already holds it.
  pub fn add_action(&mut self, state: usize, terminal: &str, action: Action) {
    if let Some(row) = self.actions.get_mut(state) {
      let cell = row.entry(terminal.to_owned()).or_default();
      if !cell.contains(&action) {
        cell.push(action);
      }
    }
  }

  pub fn set_goto(&mut self, state: usize, non_terminal: &str, target: usize) {
    if let Some(row) = self.gotos.get_mut(state) {
      row.insert(non_terminal.to_owned(), target);
    }
  }

  pub fn actions(&self, state: usize, terminal: &str) -> &[Action] {
    self.actions.get(state)
      .and_then(|row| row.get(terminal))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn goto(&self, state: usize, non_terminal: &str) -> Option<usize> {
    self.gotos.get(state)?.get(non_terminal).copied()
  }

  /// Actions of a cell joined by ` / `.
  pub fn cell(&self, state: usize, terminal: &str) -> String {
    join_actions(self.actions(state, terminal))
  }

  pub fn has_conflict(&self) -> bool {
    self.actions.iter().flat_map(IndexMap::values).any(|cell| cell.len() > 1)
  }

  pub fn has_conflict_at(&self, state: usize, terminal: &str) -> bool {
    self.actions(state, terminal).len() > 1
  }

  /// Runs the shift-reduce driver over whitespace separated tokens.
  pub fn parse(&self, input: &str) -> LrTrace {
    let mut inputs = input.split_whitespace()
      .map(str::to_owned)
      .collect::<Vec<_>>();
    inputs.push(EOF.to_owned());

    let mut trace = LrTrace::default();
    let mut tree = ParseTree::default();
    let mut stack = vec![0];
    let mut symbols: Vec<Symbol> = vec![];
    let mut nodes = vec![];
    let mut pos = 0;

    while let (Some(&state), Some(symbol)) = (stack.last(), inputs.get(pos)) {
      let cell = self.actions(state, symbol);
      let action = match cell {
        [] => "invalid symbol".to_owned(),
        [action] => action.to_string(),
        _ => format!("conflict: {}", join_actions(cell)),
      };
      trace.push(&stack, &symbols, &inputs[pos..], action);

      match cell {
        [Action::Shift(target)] => {
          stack.push(*target);
          symbols.push(symbol.clone());
          nodes.push(tree.add_leaf(symbol));
          pos += 1;
        }
        [Action::Reduce(head, production)] => {
          let count = if is_empty_production(production) {
            0
          } else {
            production.len()
          };
          if count >= stack.len() {
            trace.push(&stack, &symbols, &inputs[pos..],
              "invalid action/goto table".to_owned());
            break;
          }
          stack.truncate(stack.len() - count);
          symbols.truncate(symbols.len() - count);
          let children = nodes.split_off(nodes.len() - count);
          let node = tree.add_node(head, Some(production.clone()), children);

          let target = stack.last().and_then(|&top| self.goto(top, head));
          match target {
            Some(target) => {
              stack.push(target);
              symbols.push(head.clone());
              nodes.push(node);
            }
            None => {
              trace.push(&stack, &symbols, &inputs[pos..],
                "invalid action/goto table".to_owned());
              break;
            }
          }
        }
        [Action::Accept] => {
          if let Some(&root) = nodes.last() {
            tree.set_root(root);
            trace.tree = Some(tree);
          }
          break;
        }
        _ => break,
      }
    }

    log::trace!("LR parse finished after {} steps", trace.steps.len());
    trace
  }
}

fn join_actions(actions: &[Action]) -> String {
  actions.iter()
    .map(Action::to_string)
    .collect::<Vec<_>>()
    .join(" / ")
}

/// Markdown table with terminals, `EOF` and then non-terminals as columns.
impl Display for ActionGotoTable {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "| State |")?;
    for symbol in self.terminals.iter().chain(&self.non_terminals) {
      write!(f, " {} |", symbol)?;
    }
    write!(f, "\n|:-:|")?;
    for _ in self.terminals.iter().chain(&self.non_terminals) {
      write!(f, ":-:|")?;
    }
    writeln!(f)?;

    for state in 0..self.len() {
      write!(f, "| {} |", state)?;
      for terminal in &self.terminals {
        write!(f, " {} |", self.cell(state, terminal))?;
      }
      for non_terminal in &self.non_terminals {
        match self.goto(state, non_terminal) {
          Some(target) => write!(f, " {} |", target)?,
          None => write!(f, "  |")?,
        }
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrStep {
  pub stack: Vec<usize>,
  pub symbols: Vec<Symbol>,
  pub inputs: Vec<Symbol>,
  pub action: String,
}

/// Steps of a shift-reduce parse. The tree is only present when the input
/// was accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LrTrace {
  pub steps: Vec<LrStep>,
  pub tree: Option<ParseTree>,
}

impl LrTrace {
  pub fn is_accepted(&self) -> bool {
    self.tree.is_some()
  }

  fn push(
    &mut self,
    stack: &[usize],
    symbols: &[Symbol],
    inputs: &[Symbol],
    action: String,
  ) {
    self.steps.push(LrStep {
      stack: stack.to_vec(),
      symbols: symbols.to_vec(),
      inputs: inputs.to_vec(),
      action,
    });
  }
}

impl Display for LrTrace {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    writeln!(f, "| Stack | Symbols | Inputs | Action |")?;
    writeln!(f, "|:-:|:-:|:-:|:-:|")?;
    for step in &self.steps {
      let stack = step.stack.iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(" ");
      let symbols = if step.symbols.is_empty() {
        String::new()
      } else {
        format!("{} ", step.symbols.join(" "))
      };
      writeln!(f, "| {} | {}| {} | {} |",
        stack, symbols, step.inputs.join(" "), step.action)?;
    }
    Ok(())
  }
}

impl Grammar {
  /// Reduces on every terminal and `EOF`, regardless of lookahead.
  pub fn compute_lr0_action_goto_table(&self, automaton: &Automaton) -> ActionGotoTable {
    let mut lookaheads = self.terminals();
    lookaheads.push(EOF.to_owned());
    self.build_table(automaton, |_| lookaheads.clone())
  }

  /// Reduces on the FOLLOW set of the item's head.
  pub fn compute_slr1_action_goto_table(&self, automaton: &Automaton) -> ActionGotoTable {
    let sets = self.compute_first_and_follow_set();
    self.build_table(automaton, |item| sets.follow_set(&item.head))
  }

  /// Reduces on the item's own lookahead.
  pub fn compute_lr1_action_goto_table(&self, automaton: &Automaton) -> ActionGotoTable {
    self.build_table(automaton, |item| item.lookahead.iter().cloned().collect())
  }

  pub fn compute_lalr1_action_goto_table(&self, automaton: &Automaton) -> ActionGotoTable {
    self.compute_lr1_action_goto_table(automaton)
  }

  fn build_table(
    &self,
    automaton: &Automaton,
    reduce_on: impl Fn(&Item) -> Vec<Symbol>,
  ) -> ActionGotoTable {
    let mut table = ActionGotoTable::new(
      automaton.len(), &self.terminals(), self.non_terminals());

    for edge in automaton.edges() {
      if self.is_non_terminal(&edge.symbol) {
        table.set_goto(edge.from, &edge.symbol, edge.to);
      } else {
        table.add_action(edge.from, &edge.symbol, Action::Shift(edge.to));
      }
    }

    for (state, node) in automaton.nodes().iter().enumerate() {
      if node.accept {
        table.add_action(state, EOF, Action::Accept);
        continue;
      }
      for item in node.kernel.iter().chain(node.non_kernel.iter()) {
        if !item.is_complete() {
          continue;
        }
        for terminal in reduce_on(item) {
          let action = Action::Reduce(item.head.clone(), item.production());
          table.add_action(state, &terminal, action);
        }
      }
    }

    table
  }
}
