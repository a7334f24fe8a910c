use std::path::PathBuf;

use xiaozhi_error::DomainError;
use xiaozhi_http::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("No file selected")]
    NoFileSelected,

    /// The chosen file does not carry a spreadsheet extension.
    #[error("Not a spreadsheet: {0}")]
    NotASpreadsheet(String),

    #[error("Failed to prepare log directory {path}: {source}")]
    Logging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<AppError> for xiaozhi_error::Error {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Config(e) => DomainError::Config {
                message: e.to_string(),
            }
            .into(),
            e @ (AppError::NoFileSelected | AppError::NotASpreadsheet(_)) => {
                DomainError::Selection {
                    message: e.to_string(),
                }
                .into()
            }
            e @ AppError::Logging { .. } => DomainError::Io {
                message: e.to_string(),
            }
            .into(),
            AppError::Api(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xiaozhi_error::Severity;

    #[test]
    fn selection_errors_map_to_the_selection_domain() {
        let e: xiaozhi_error::Error = AppError::NoFileSelected.into();
        assert!(matches!(
            e,
            xiaozhi_error::Error::Domain(DomainError::Selection { ref message }) if message == "No file selected"
        ));
        assert_eq!(e.severity(), Severity::Error);
    }

    #[test]
    fn api_errors_keep_their_classification() {
        let e: xiaozhi_error::Error = AppError::Api(ApiError::Rejected("offline".into())).into();
        let direct: xiaozhi_error::Error = ApiError::Rejected("offline".into()).into();
        assert_eq!(e.to_string(), direct.to_string());
    }
}
