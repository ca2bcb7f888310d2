/// Instruction and transaction construction for the barter escrow
pub mod assembler;
pub mod builder;

pub use assembler::*;
pub use builder::*;
