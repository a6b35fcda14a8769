mod atomic_file;
mod tree_walker;

pub use atomic_file::AtomicFileWriter;
pub use tree_walker::{TreeWalker, WalkedFile};
