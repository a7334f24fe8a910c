//! Typed calls for the label-analysis backend.
//!
//! Upload endpoints take the main workbook plus an optional filter workbook;
//! rows of the main workbook whose `userContent` appears in the filter
//! workbook are dropped server-side.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use xiaozhi_core::{FileHandle, MAX_UPLOAD_BYTES};

use reqwest::multipart::{Form, Part};

use crate::{ApiClient, ApiError};

/// App flavour whose rows are analysed; the backend maps it to a package name.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    #[default]
    #[serde(rename = "安卓")]
    Android,
    #[serde(rename = "iOS")]
    Ios,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "安卓",
            Platform::Ios => "iOS",
        }
    }
}

/// Which columns of the metric table the backend fills in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// All rows for the platform.
    Initial,
    /// Rows left after excluding the given device ids.
    User,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisType {
    /// Label frequency table.
    #[default]
    Default,
    /// Function-usage labels only.
    Function,
    /// Labels below the low-volume threshold.
    LowVolume,
}

impl AnalysisType {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisType::Default => "default",
            AnalysisType::Function => "function",
            AnalysisType::LowVolume => "lowVolume",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub file: FileHandle,
    pub filter_file: Option<FileHandle>,
    pub device_ids: Vec<String>,
    pub data_types: Vec<DataType>,
    pub platform: Platform,
}

impl AnalyzeRequest {
    pub fn new(file: FileHandle) -> Self {
        Self {
            file,
            filter_file: None,
            device_ids: Vec::new(),
            data_types: vec![DataType::Initial, DataType::User],
            platform: Platform::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabelRequest {
    pub file: FileHandle,
    pub filter_file: Option<FileHandle>,
    pub device_ids: Vec<String>,
    pub platform: Platform,
    pub analysis_type: AnalysisType,
}

impl LabelRequest {
    pub fn new(file: FileHandle) -> Self {
        Self {
            file,
            filter_file: None,
            device_ids: Vec::new(),
            platform: Platform::default(),
            analysis_type: AnalysisType::default(),
        }
    }
}

/// One line of the analysis table. Columns not requested come back blank.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetricRow {
    pub metric: String,
    #[serde(deserialize_with = "blank_as_none")]
    pub initial_data: Option<u64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub user_data: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LabelCount {
    pub label: String,
    #[serde(deserialize_with = "blank_as_none")]
    pub count: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Health {
    pub status: String,
}

impl Health {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

pub type SqlRow = Map<String, Value>;

/// The backend sends `""` for cells it was not asked to compute.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse().map(Some).map_err(D::Error::custom),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a count, got {n}"))),
        other => Err(D::Error::custom(format!("expected a count, got {other}"))),
    }
}

async fn file_part(file: &FileHandle) -> Result<Part, ApiError> {
    let bytes = file
        .read_bytes(MAX_UPLOAD_BYTES)
        .await
        .map_err(|e| ApiError::Upload {
            name: file.name().to_string(),
            message: e.to_string(),
        })?;
    Part::bytes(bytes)
        .file_name(file.name().to_string())
        .mime_str(file.content_type())
        .map_err(|e| ApiError::Build(e.to_string()))
}

async fn upload_form(file: &FileHandle, filter_file: Option<&FileHandle>) -> Result<Form, ApiError> {
    let (main, filter) = futures::future::try_join(file_part(file), async {
        match filter_file {
            Some(f) => file_part(f).await.map(Some),
            None => Ok(None),
        }
    })
    .await?;

    let form = Form::new().part("file", main);
    Ok(match filter {
        Some(part) => form.part("filterFile", part),
        None => form,
    })
}

fn join_device_ids(ids: &[String]) -> String {
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

impl ApiClient {
    /// `GET /api/health`
    pub async fn health(&self) -> Result<Health, ApiError> {
        self.get("health").send_json().await
    }

    /// `POST /api/analyze`: usage metrics for the chosen platform.
    #[tracing::instrument(skip_all, fields(file = %req.file.name(), platform = req.platform.as_str()))]
    pub async fn analyze(&self, req: &AnalyzeRequest) -> Result<Vec<MetricRow>, ApiError> {
        let form = upload_form(&req.file, req.filter_file.as_ref()).await;
        let data_types = serde_json::to_string(&req.data_types)
            .map_err(|e| ApiError::Build(e.to_string()));
        self.post("analyze")
            .and_then(|b| {
                let form = form?
                    .text("deviceIds", join_device_ids(&req.device_ids))
                    .text("dataTypes", data_types?)
                    .text("platform", req.platform.as_str());
                Ok(b.multipart(form))
            })
            .fetch_data()
            .await
    }

    /// `POST /api/label-process`: label counts for the chosen analysis.
    #[tracing::instrument(skip_all, fields(file = %req.file.name(), analysis = req.analysis_type.as_str()))]
    pub async fn label_process(&self, req: &LabelRequest) -> Result<Vec<LabelCount>, ApiError> {
        let form = upload_form(&req.file, req.filter_file.as_ref()).await;
        self.post("label-process")
            .and_then(|b| {
                let form = form?
                    .text("deviceIds", join_device_ids(&req.device_ids))
                    .text("platform", req.platform.as_str())
                    .text("analysisType", req.analysis_type.as_str());
                Ok(b.multipart(form))
            })
            .fetch_data()
            .await
    }

    /// `POST /api/sql-query` against the rows loaded by the last analysis.
    pub async fn sql_query(&self, query: &str) -> Result<Vec<SqlRow>, ApiError> {
        self.post("sql-query")
            .json(&serde_json::json!({ "query": query }))
            .fetch_data()
            .await
    }
}
