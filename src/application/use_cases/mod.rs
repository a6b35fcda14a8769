mod create_archive;
mod extract_archive;
mod list_archive;

pub use create_archive::CreateArchiveUseCase;
pub use extract_archive::{CorruptPolicy, ExtractArchiveUseCase};
pub use list_archive::ListArchiveUseCase;
