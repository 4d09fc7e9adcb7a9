//! Cardinal Core - Request and Configuration Types
//!
//! Pure data structures and collaborator seams shared by the resolver and
//! its callers. The token alphabet, field catalog and script compiler are
//! described here; nothing in this crate reads a request or resolves one.

mod config;
mod error;
mod field;
mod resolved;
mod token;

pub use config::*;
pub use error::*;
pub use field::*;
pub use resolved::*;
pub use token::*;
