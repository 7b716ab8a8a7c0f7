// sysdeps-core/src/repository/mod.rs
pub mod index;
pub mod layout;
pub mod scanner;

pub use index::{DescriptorEntry, IndexBuilder, RepositoryIndex, ScanRecord};
pub use scanner::{scan, ScanOptions};
