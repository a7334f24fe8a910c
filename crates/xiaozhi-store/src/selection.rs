use xiaozhi_core::FileHandle;

use crate::Slot;

/// The main spreadsheet and the optional filter spreadsheet chosen by the
/// user, plus the names shown next to them.
///
/// Names are independent of the handles: setting a file does not touch its
/// name slot and vice versa.
#[derive(Debug)]
pub struct FileSelection {
    selected_file: Slot<Option<FileHandle>>,
    filter_file: Slot<Option<FileHandle>>,
    file_name: Slot<String>,
    filter_file_name: Slot<String>,
}

/// Owned copy of all four slots taken at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub selected_file: Option<FileHandle>,
    pub filter_file: Option<FileHandle>,
    pub file_name: String,
    pub filter_file_name: String,
}

impl Default for FileSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSelection {
    pub fn new() -> Self {
        Self {
            selected_file: Slot::new("selected_file", None),
            filter_file: Slot::new("filter_file", None),
            file_name: Slot::new("file_name", String::new()),
            filter_file_name: Slot::new("filter_file_name", String::new()),
        }
    }

    pub fn selected_file(&self) -> &Slot<Option<FileHandle>> {
        &self.selected_file
    }

    pub fn filter_file(&self) -> &Slot<Option<FileHandle>> {
        &self.filter_file
    }

    pub fn file_name(&self) -> &Slot<String> {
        &self.file_name
    }

    pub fn filter_file_name(&self) -> &Slot<String> {
        &self.filter_file_name
    }

    /// Back to the empty baseline: no files, empty names.
    pub fn reset_files(&self) {
        self.selected_file.set(None);
        self.filter_file.set(None);
        self.file_name.set(String::new());
        self.filter_file_name.set(String::new());
        tracing::debug!("file selection reset");
    }

    pub fn update_selected_file(&self, file: Option<FileHandle>) {
        self.selected_file.set(file);
    }

    pub fn update_filter_file(&self, file: Option<FileHandle>) {
        self.filter_file.set(file);
    }

    pub fn update_file_name(&self, name: impl Into<String>) {
        self.file_name.set(name.into());
    }

    pub fn update_filter_file_name(&self, name: impl Into<String>) {
        self.filter_file_name.set(name.into());
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            selected_file: self.selected_file.get(),
            filter_file: self.filter_file.get(),
            file_name: self.file_name.get(),
            filter_file_name: self.filter_file_name.get(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot() == SelectionSnapshot::default()
    }
}
