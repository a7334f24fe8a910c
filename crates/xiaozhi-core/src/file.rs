use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ArcStr;

/// Extensions the backend accepts for uploaded workbooks.
pub const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xls", "xlsm", "xltx", "xltm"];

/// Upload ceiling enforced by the backend (16 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("{name} is {size_bytes} bytes, above the {limit} byte upload limit")]
    TooLarge {
        name: String,
        size_bytes: u64,
        limit: u64,
    },

    #[error("{path:?} is not a regular file")]
    NotARegularFile { path: PathBuf },

    #[error("I/O failure reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the content behind a [`FileHandle`] lives.
#[derive(Clone)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Path(p) => f.debug_tuple("Path").field(p).finish(),
            FileSource::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
        }
    }
}

#[derive(Debug)]
struct FileInner {
    name: ArcStr,
    mime: Option<String>,
    source: FileSource,
}

/// Opaque reference to a user-chosen file.
///
/// Cloning shares the same underlying file. Equality is identity: two handles
/// are equal only when they were cloned from the same original, even if they
/// point at the same path.
#[derive(Clone)]
pub struct FileHandle(Arc<FileInner>);

impl FileHandle {
    /// Handle to a file on disk; the display name is the path's file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self(Arc::new(FileInner {
            name: name.into(),
            mime: None,
            source: FileSource::Path(path),
        }))
    }

    /// Handle to an in-memory buffer, e.g. content received from a picker.
    pub fn from_bytes(name: impl Into<ArcStr>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(Arc::new(FileInner {
            name: name.into(),
            mime: None,
            source: FileSource::Bytes(bytes.into()),
        }))
    }

    /// Returns a new handle (distinct identity) carrying the given MIME type.
    pub fn with_mime(self, mime: impl Into<String>) -> Self {
        let inner = &self.0;
        Self(Arc::new(FileInner {
            name: inner.name.clone(),
            mime: Some(mime.into()),
            source: inner.source.clone(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn mime(&self) -> Option<&str> {
        self.0.mime.as_deref()
    }

    pub fn source(&self) -> &FileSource {
        &self.0.source
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.0.source {
            FileSource::Path(p) => Some(p),
            FileSource::Bytes(_) => None,
        }
    }

    /// Lower-cased extension without the dot. A leading dot alone (`.xlsx`)
    /// does not count as an extension.
    pub fn extension(&self) -> Option<String> {
        let name = self.name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// True when the name carries one of [`SPREADSHEET_EXTENSIONS`].
    pub fn is_spreadsheet(&self) -> bool {
        self.extension()
            .is_some_and(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.as_str()))
    }

    /// MIME type to send with an upload, derived from the extension when not set.
    pub fn content_type(&self) -> &str {
        if let Some(mime) = self.mime() {
            return mime;
        }
        match self.extension().as_deref() {
            Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Some("xltx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.template",
            Some("xlsm") => "application/vnd.ms-excel.sheet.macroEnabled.12",
            Some("xltm") => "application/vnd.ms-excel.template.macroEnabled.12",
            Some("xls") => "application/vnd.ms-excel",
            _ => "application/octet-stream",
        }
    }

    /// Reads the full content, refusing anything above `limit` bytes.
    #[cfg(feature = "read-tokio")]
    pub async fn read_bytes(&self, limit: u64) -> Result<Vec<u8>, FileError> {
        match &self.0.source {
            FileSource::Bytes(bytes) => {
                let size_bytes = bytes.len() as u64;
                if size_bytes > limit {
                    return Err(FileError::TooLarge {
                        name: self.name().to_string(),
                        size_bytes,
                        limit,
                    });
                }
                Ok(bytes.to_vec())
            }
            FileSource::Path(path) => {
                let io_err = |source| FileError::Io {
                    path: path.clone(),
                    source,
                };
                let meta = tokio::fs::metadata(path).await.map_err(io_err)?;
                if !meta.is_file() {
                    return Err(FileError::NotARegularFile { path: path.clone() });
                }
                if meta.len() > limit {
                    return Err(FileError::TooLarge {
                        name: self.name().to_string(),
                        size_bytes: meta.len(),
                        limit,
                    });
                }
                tokio::fs::read(path).await.map_err(io_err)
            }
        }
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for FileHandle {}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.0.name)
            .field("source", &self.0.source)
            .finish()
    }
}
