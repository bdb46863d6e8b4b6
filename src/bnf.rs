//! Tokenizer and parser of the textual grammar notation
//! `HEAD -> sym sym | sym ...`.

use std::mem;
use crate::error::{Error, Result};
use crate::grammar::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Symbol,
  Arrow,
  Bar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub text: String,
  /// 1-based
  pub line: usize,
  /// 1-based, counted in codepoints
  pub column: usize,
}

const ARROWS: &[&str] = &["->", "→"];
const BARS: &[char] = &['|', '｜'];
const EPSILONS: &[&str] = &["ε", "ϵ"];

pub fn tokenize(text: &str) -> Vec<Token> {
  let chars = text.chars().collect::<Vec<_>>();
  let mut tokens = vec![];
  let mut line = 1;
  let mut column = 1;
  let mut i = 0;

  while i < chars.len() {
    let c = chars[i];
    if c == '\r' || c == '\n' {
      if c == '\r' && chars.get(i + 1) == Some(&'\n') {
        i += 1;
      }
      i += 1;
      line += 1;
      column = 1;
    } else if c.is_whitespace() {
      i += 1;
      column += 1;
    } else if let Some(arrow) = arrow_at(&chars, i) {
      tokens.push(Token {
        kind: TokenKind::Arrow,
        text: arrow.to_owned(),
        line,
        column,
      });
      let len = arrow.chars().count();
      i += len;
      column += len;
    } else if BARS.contains(&c) {
      tokens.push(Token {
        kind: TokenKind::Bar,
        text: c.to_string(),
        line,
        column,
      });
      i += 1;
      column += 1;
    } else {
      let start = i;
      while i < chars.len()
        && !chars[i].is_whitespace()
        && !BARS.contains(&chars[i])
        && arrow_at(&chars, i).is_none()
      {
        i += 1;
      }
      tokens.push(Token {
        kind: TokenKind::Symbol,
        text: chars[start..i].iter().collect(),
        line,
        column,
      });
      column += i - start;
    }
  }

  tokens
}

fn arrow_at(chars: &[char], i: usize) -> Option<&'static str> {
  ARROWS.iter().copied().find(|arrow| {
    arrow.chars().enumerate().all(|(k, c)| chars.get(i + k) == Some(&c))
  })
}

/// Parses grammar text in a single pass over the tokens. A symbol directly
/// followed by an arrow opens a new head.
pub(crate) fn parse(text: &str) -> Result<Grammar> {
  let tokens = tokenize(text);
  let mut grammar = Grammar::new();
  let mut head: Option<&str> = None;
  let mut alternative = Production::new();

  let mut i = 0;
  while i < tokens.len() {
    let token = &tokens[i];
    match token.kind {
      TokenKind::Symbol
        if tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::Arrow) =>
      {
        if let Some(head) = head {
          flush(&mut grammar, head, &mut alternative, token.line, token.column)?;
        }
        head = Some(&token.text);
        i += 2;
        continue;
      }
      TokenKind::Symbol => {
        if head.is_none() {
          return Err(missing_head(token));
        }
        alternative.push(normalize(&token.text));
      }
      TokenKind::Arrow => return Err(missing_head(token)),
      TokenKind::Bar => {
        let head = head.ok_or_else(|| missing_head(token))?;
        flush(&mut grammar, head, &mut alternative, token.line, token.column)?;
      }
    }
    i += 1;
  }

  if let (Some(head), Some(last)) = (head, tokens.last()) {
    let column = last.column + last.text.chars().count();
    flush(&mut grammar, head, &mut alternative, last.line, column)?;
  }

  grammar.init_terminals();
  grammar.deduplicate();
  log::debug!("parsed grammar with {} non-terminals",
    grammar.non_terminals().len());
  Ok(grammar)
}

fn flush(
  grammar: &mut Grammar,
  head: &str,
  alternative: &mut Production,
  line: usize,
  column: usize,
) -> Result<()> {
  if alternative.is_empty() {
    return Err(Error::Syntax {
      line,
      column,
      message: format!("Found empty production for '{}'.", head),
    });
  }
  grammar.add_production(head, mem::take(alternative));
  Ok(())
}

fn missing_head(token: &Token) -> Error {
  Error::Syntax {
    line: token.line,
    column: token.column,
    message: "Can not find the head of the production.".to_owned(),
  }
}

fn normalize(symbol: &str) -> Symbol {
  if EPSILONS.contains(&symbol) {
    EMPTY.to_owned()
  } else {
    symbol.to_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn error_message(text: &str) -> String {
    Grammar::parse(text).unwrap_err().to_string()
  }

  #[test]
  fn tokens() {
    let tokens = tokenize("S -> a\r\n  | bc→ε\rx");
    let summary = tokens.iter()
      .map(|t| (t.kind, t.text.as_str(), t.line, t.column))
      .collect::<Vec<_>>();

    assert_eq!(summary, vec![
      (TokenKind::Symbol, "S", 1, 1),
      (TokenKind::Arrow, "->", 1, 3),
      (TokenKind::Symbol, "a", 1, 6),
      (TokenKind::Bar, "|", 2, 3),
      (TokenKind::Symbol, "bc", 2, 5),
      (TokenKind::Arrow, "→", 2, 7),
      (TokenKind::Symbol, "ε", 2, 8),
      (TokenKind::Symbol, "x", 3, 1),
    ]);
  }

  #[test]
  fn symbols_stop_at_arrows_and_bars() {
    let texts = tokenize("A->b|c")
      .into_iter()
      .map(|t| t.text)
      .collect::<Vec<_>>();
    assert_eq!(texts, vec!["A", "->", "b", "|", "c"]);
  }

  #[test]
  fn parse_simple() {
    let grammar = Grammar::parse("S -> a S b | ϵ\nS → c | a S b").unwrap();
    assert_eq!(grammar.to_string(), "S -> a S b\n   | ε\n   | c\n");
    assert_eq!(grammar.terminals(), symbols("a b c"));
  }

  #[test]
  fn parse_multiple_heads() {
    let grammar: Grammar = "
      bexpr -> bexpr or bterm | bterm
      bterm -> bterm and bfactor | bfactor
      bfactor -> not bfactor | ( bexpr ) | true | false
    ".parse().unwrap();

    assert_eq!(grammar.to_string(), "  bexpr -> bexpr or bterm
         | bterm
  bterm -> bterm and bfactor
         | bfactor
bfactor -> not bfactor
         | ( bexpr )
         | true
         | false
");
    assert_eq!(grammar.start_symbol().map(String::as_str), Some("bexpr"));
  }

  #[test]
  fn parse_empty_text() {
    let grammar = Grammar::parse("  \n ").unwrap();
    assert!(grammar.is_empty());
  }

  #[test]
  fn missing_head() {
    assert_eq!(error_message("->"),
      "Line 1 Column 1: Can not find the head of the production.");
    assert_eq!(error_message("S"),
      "Line 1 Column 1: Can not find the head of the production.");
    assert_eq!(error_message("|"),
      "Line 1 Column 1: Can not find the head of the production.");
    assert_eq!(error_message("S->->a"),
      "Line 1 Column 4: Can not find the head of the production.");
    assert_eq!(error_message("S -> a\n| -> b"),
      "Line 2 Column 3: Can not find the head of the production.");
  }

  #[test]
  fn empty_production() {
    assert_eq!(error_message("S->"),
      "Line 1 Column 4: Found empty production for 'S'.");
    assert_eq!(error_message("S->|b"),
      "Line 1 Column 4: Found empty production for 'S'.");
    assert_eq!(error_message("S->a||b"),
      "Line 1 Column 6: Found empty production for 'S'.");
    assert_eq!(error_message("S->a|B->c"),
      "Line 1 Column 6: Found empty production for 'S'.");
  }

  #[test]
  fn error_position_counts_codepoints() {
    let err = Grammar::parse("Σ → α |").unwrap_err();
    assert_eq!(err, Error::Syntax {
      line: 1,
      column: 8,
      message: "Found empty production for 'Σ'.".to_owned(),
    });
  }

  #[test]
  fn round_trip() {
    let grammar = Grammar::parse("E -> E + T | T  T -> T * F | F  F -> ( E ) | id")
      .unwrap();
    let text = grammar.to_string();
    assert_eq!(text, "\
E -> E + T
   | T
T -> T * F
   | F
F -> ( E )
   | id
");
    assert_eq!(Grammar::parse(&text).unwrap(), grammar);
  }
}
