//! Value types shared between the selection store and the API client.

pub mod arc_str;
pub mod file;

pub use arc_str::ArcStr;
pub use file::{FileError, FileHandle, FileSource, MAX_UPLOAD_BYTES, SPREADSHEET_EXTENSIONS};
