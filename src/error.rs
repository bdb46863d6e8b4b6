use crate::grammar::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
  /// Malformed grammar text. Positions are 1-based.
  #[error("Line {line} Column {column}: {message}")]
  Syntax {
    line: usize,
    column: usize,
    message: String,
  },
  #[error("Can not find the symbol \"{0}\".")]
  InvalidSymbol(Symbol),
  #[error("Can not find a start symbol.")]
  NoStartSymbol,
  #[error("Left recursion cannot be eliminated for \"{0}\".")]
  UnresolvableRecursion(Symbol),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn messages() {
    let err = Error::Syntax {
      line: 2,
      column: 7,
      message: "Can not find the head of the production.".to_owned(),
    };
    assert_eq!(err.to_string(),
      "Line 2 Column 7: Can not find the head of the production.");
    assert_eq!(Error::InvalidSymbol("B".to_owned()).to_string(),
      "Can not find the symbol \"B\".");
    assert_eq!(Error::UnresolvableRecursion("A".to_owned()).to_string(),
      "Left recursion cannot be eliminated for \"A\".");
  }
}
