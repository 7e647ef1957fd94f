//! The intermediate representation checked by the resolver: types, variables,
//! instructions, blocks and the signatures of catalog symbols.

mod block;
mod instruction;
mod symbol;
mod types;
mod variable;

pub use block::*;
pub use instruction::*;
pub use symbol::*;
pub use types::*;
pub use variable::*;
