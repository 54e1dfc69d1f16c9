pub mod documents;
pub mod export;

pub use documents::{delete, list, new, rename, ListArgs, NewArgs, RenameArgs};
pub use export::{export, show, ExportArgs};
