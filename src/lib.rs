//! Context-free grammar toolkit: grammar text parsing, left-recursion
//! elimination and left factoring, FIRST/FOLLOW sets, LR(0), SLR(1), LR(1),
//! LALR(1) and LL(1) tables, and table driven parsing with step traces.

pub mod bnf;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod sets;
pub mod transform;

pub use error::{Error, Result};
pub use grammar::{Grammar, Production, Symbol};
pub use sets::FirstAndFollowSet;
