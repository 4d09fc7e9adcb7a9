//! Token readers for cardinality requests

pub mod scanner;
pub mod stream;

pub use scanner::*;
pub use stream::*;
