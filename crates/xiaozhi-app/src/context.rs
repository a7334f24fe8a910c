use xiaozhi_core::FileHandle;
use xiaozhi_error::{CombinedPolicy, ErrorPolicy, TracingPolicy};
use xiaozhi_http::{
    AnalysisType, AnalyzeRequest, ApiClient, LabelCount, LabelRequest, MetricRow,
    NotificationBus, Platform, SqlRow, notifications,
};
use xiaozhi_store::{FileSelection, SelectionSnapshot};

use crate::{AppError, config::AppConfig};

/// The store and the client, wired together.
///
/// The two halves stay independent; this is the only place that reads the
/// selection to build upload requests.
#[derive(Debug)]
pub struct AppContext<'s> {
    config: AppConfig,
    client: ApiClient,
    files: &'s FileSelection,
    bus: NotificationBus,
}

impl AppContext<'static> {
    /// Context over the process-wide selection and notification bus.
    pub fn global(config: AppConfig) -> Result<Self, AppError> {
        let client = ApiClient::from_config(&config.http)?;
        Ok(Self {
            config,
            client,
            files: xiaozhi_store::files(),
            bus: notifications().clone(),
        })
    }
}

impl<'s> AppContext<'s> {
    pub fn new(
        config: AppConfig,
        files: &'s FileSelection,
        bus: NotificationBus,
    ) -> Result<Self, AppError> {
        let client = ApiClient::with_sink(&config.http, std::sync::Arc::new(bus.clone()))?;
        Ok(Self {
            config,
            client,
            files,
            bus,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn files(&self) -> &FileSelection {
        self.files
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    /// Logs and notifies a selection problem, then hands back the error.
    /// API failures never come through here; the client's error hook has
    /// already notified them.
    fn refuse(&self, make: impl Fn() -> AppError) -> AppError {
        let policy = CombinedPolicy::new()
            .push(TracingPolicy)
            .push(self.bus.clone());
        policy.emit(&make().into());
        make()
    }

    /// Make `file` the main spreadsheet and show its own name next to it.
    pub fn choose_file(&self, file: FileHandle) -> Result<(), AppError> {
        let file = self.ensure_spreadsheet(file)?;
        self.files.update_file_name(file.name());
        self.files.update_selected_file(Some(file));
        Ok(())
    }

    /// Make `file` the filter spreadsheet and show its own name next to it.
    pub fn choose_filter_file(&self, file: FileHandle) -> Result<(), AppError> {
        let file = self.ensure_spreadsheet(file)?;
        self.files.update_filter_file_name(file.name());
        self.files.update_filter_file(Some(file));
        Ok(())
    }

    fn ensure_spreadsheet(&self, file: FileHandle) -> Result<FileHandle, AppError> {
        if file.is_spreadsheet() {
            return Ok(file);
        }
        let name = file.name().to_string();
        Err(self.refuse(|| AppError::NotASpreadsheet(name.clone())))
    }

    pub fn clear_files(&self) {
        self.files.reset_files();
    }

    pub fn analyze_request(
        &self,
        device_ids: &[String],
        platform: Platform,
    ) -> Result<AnalyzeRequest, AppError> {
        let SelectionSnapshot {
            selected_file,
            filter_file,
            ..
        } = self.files.snapshot();
        let file = selected_file.ok_or_else(|| self.refuse(|| AppError::NoFileSelected))?;
        Ok(AnalyzeRequest {
            filter_file,
            device_ids: device_ids.to_vec(),
            platform,
            ..AnalyzeRequest::new(file)
        })
    }

    pub fn label_request(
        &self,
        device_ids: &[String],
        platform: Platform,
        analysis_type: AnalysisType,
    ) -> Result<LabelRequest, AppError> {
        let SelectionSnapshot {
            selected_file,
            filter_file,
            ..
        } = self.files.snapshot();
        let file = selected_file.ok_or_else(|| self.refuse(|| AppError::NoFileSelected))?;
        Ok(LabelRequest {
            filter_file,
            device_ids: device_ids.to_vec(),
            platform,
            analysis_type,
            ..LabelRequest::new(file)
        })
    }

    #[tracing::instrument(skip(self, device_ids), fields(devices = device_ids.len()))]
    pub async fn analyze_selected(
        &self,
        device_ids: &[String],
        platform: Platform,
    ) -> Result<Vec<MetricRow>, AppError> {
        let req = self.analyze_request(device_ids, platform)?;
        Ok(self.client.analyze(&req).await?)
    }

    #[tracing::instrument(skip(self, device_ids), fields(devices = device_ids.len()))]
    pub async fn label_process_selected(
        &self,
        device_ids: &[String],
        platform: Platform,
        analysis_type: AnalysisType,
    ) -> Result<Vec<LabelCount>, AppError> {
        let req = self.label_request(device_ids, platform, analysis_type)?;
        Ok(self.client.label_process(&req).await?)
    }

    pub async fn sql_query(&self, query: &str) -> Result<Vec<SqlRow>, AppError> {
        Ok(self.client.sql_query(query).await?)
    }
}
