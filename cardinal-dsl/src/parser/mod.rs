//! Parser module: request tokens to raw fields

pub mod ast;
pub mod field;
pub mod parser;

pub use ast::*;
pub use field::*;
pub use parser::*;
