mod entry_path;

pub use entry_path::EntryPath;
