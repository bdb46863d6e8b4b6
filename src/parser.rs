//! LR automata, parsing tables and the drivers that run them.

mod automaton;
mod item;
mod ll1;
mod table;
mod tree;

pub use self::automaton::{Automaton, Edge, Node};
pub use self::item::{Item, ItemSet};
pub use self::ll1::{Ll1Table, LlStep, LlTrace};
pub use self::table::{Action, ActionGotoTable, LrStep, LrTrace};
pub use self::tree::{ParseTree, TreeNode};
