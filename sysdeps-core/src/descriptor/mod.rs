// sysdeps-core/src/descriptor/mod.rs
pub mod parser;

pub use parser::{load, parse, parse_identity, IdentityFields};
