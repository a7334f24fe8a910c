//! Observable file-selection state shared across the application.
//!
//! A process-wide [`FileSelection`] is available through [`files`], with
//! free-function shorthands for its operations. Independent instances can be
//! created with [`FileSelection::new`], e.g. per test or per window.

mod selection;
mod slot;

pub use selection::{FileSelection, SelectionSnapshot};
pub use slot::Slot;
pub use xiaozhi_core::FileHandle;

use once_cell::sync::Lazy;

static FILES: Lazy<FileSelection> = Lazy::new(FileSelection::new);

/// The process-wide selection, created on first access.
pub fn files() -> &'static FileSelection {
    &FILES
}

pub fn reset_files() {
    files().reset_files()
}

pub fn update_selected_file(file: Option<FileHandle>) {
    files().update_selected_file(file)
}

pub fn update_filter_file(file: Option<FileHandle>) {
    files().update_filter_file(file)
}

pub fn update_file_name(name: impl Into<String>) {
    files().update_file_name(name)
}

pub fn update_filter_file_name(name: impl Into<String>) {
    files().update_filter_file_name(name)
}
