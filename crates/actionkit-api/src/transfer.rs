//! Export and import endpoints.
//!
//! File conversion is delegated to registered [`Exporter`] and [`Importer`]
//! implementations looked up by name. An export action serializes a sealed
//! [`ExportPayload`] into its URL; the export endpoint opens it and streams
//! the converted file back. Imports arrive as multipart uploads naming
//! their importer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use actionkit_core::{ActionError, ActionResult, Notification, Redirect, ValidationErrors};

use crate::context::RequestContext;
use crate::dispatch::{back_with_errors, flash_notifications, DispatchResponse};
use crate::lang;
use crate::token::TokenError;

/// Spreadsheet formats understood by converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriterType {
    #[default]
    Xlsx,
    Csv,
    Tsv,
    Ods,
    Xls,
    Html,
}

impl WriterType {
    pub fn extension(&self) -> &'static str {
        match self {
            WriterType::Xlsx => "xlsx",
            WriterType::Csv => "csv",
            WriterType::Tsv => "tsv",
            WriterType::Ods => "ods",
            WriterType::Xls => "xls",
            WriterType::Html => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            WriterType::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            WriterType::Csv => "text/csv",
            WriterType::Tsv => "text/tab-separated-values",
            WriterType::Ods => "application/vnd.oasis.opendocument.spreadsheet",
            WriterType::Xls => "application/vnd.ms-excel",
            WriterType::Html => "text/html",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "xlsx" => Some(WriterType::Xlsx),
            "csv" => Some(WriterType::Csv),
            "tsv" => Some(WriterType::Tsv),
            "ods" => Some(WriterType::Ods),
            "xls" => Some(WriterType::Xls),
            "html" => Some(WriterType::Html),
            _ => None,
        }
    }

    /// Detect the format from a file name, defaulting to xlsx.
    pub fn from_file_name(file_name: &str) -> Self {
        file_name
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
            .unwrap_or_default()
    }
}

/// Sealed into the export URL by the export action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub exporter: Option<String>,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

/// What an exporter is asked to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub file_name: String,
    pub writer: WriterType,
}

/// A converted file ready for download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// A file whose content type follows its writer.
    pub fn new(request: &ExportRequest, bytes: Vec<u8>) -> Self {
        Self {
            file_name: request.file_name.clone(),
            content_type: request.writer.content_type().to_string(),
            bytes,
        }
    }
}

/// An uploaded file handed to an importer.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Converts data into a downloadable file.
#[cfg_attr(test, mockall::automock)]
pub trait Exporter: Send + Sync {
    fn export(&self, request: &ExportRequest) -> ActionResult<ExportFile>;
}

/// Reads an uploaded file and persists its rows.
#[cfg_attr(test, mockall::automock)]
pub trait Importer: Send + Sync {
    /// Returns the number of imported rows.
    fn import(&self, file: &UploadedFile) -> ActionResult<usize>;
}

// =============================================================================
// Registry
// =============================================================================

/// Named converters.
pub struct TransferRegistry<T: ?Sized> {
    entries: RwLock<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized> TransferRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register a converter, replacing any previous one with the same name.
    pub fn register(&self, name: impl Into<String>, converter: Arc<T>) {
        let name = name.into();
        tracing::info!("Registered converter: {}", name);
        self.entries.write().insert(name, converter);
    }

    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl<T: ?Sized> Default for TransferRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for TransferRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRegistry")
            .field("names", &self.names())
            .finish()
    }
}

// =============================================================================
// Endpoints
// =============================================================================

/// Export endpoint failures.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Export token missing")]
    MissingToken,

    #[error("Invalid export token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Exporter '{0}' not found")]
    UnknownExporter(String),

    #[error("Export failed: {0}")]
    Failed(#[source] ActionError),
}

impl TransferError {
    /// HTTP status for the failure.
    pub fn status(&self) -> u16 {
        match self {
            TransferError::MissingToken | TransferError::InvalidToken(_) => 400,
            TransferError::UnknownExporter(_) => 404,
            TransferError::Failed(_) => 500,
        }
    }
}

/// Open an export token and run its exporter.
pub fn export(ctx: &RequestContext, token: Option<&str>) -> Result<ExportFile, TransferError> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or(TransferError::MissingToken)?;
    let payload: ExportPayload = ctx.tokens().open(token)?;

    let name = payload.exporter.unwrap_or_default();
    let exporter = ctx
        .services()
        .exporters()
        .get(&name)
        .ok_or_else(|| TransferError::UnknownExporter(name.clone()))?;

    let request = ExportRequest {
        writer: WriterType::from_file_name(&payload.file_name),
        file_name: payload.file_name,
    };
    tracing::info!(exporter = %name, file = %request.file_name, "Running export");

    exporter.export(&request).map_err(|e| {
        tracing::error!(exporter = %name, "Export failed: {}", e);
        TransferError::Failed(e)
    })
}

/// Run a named importer over an uploaded file and redirect back.
pub fn import(
    ctx: &RequestContext,
    importer: Option<&str>,
    file: Option<UploadedFile>,
) -> DispatchResponse {
    let Some(converter) = importer
        .filter(|name| !name.is_empty())
        .and_then(|name| ctx.services().importers().get(name))
    else {
        tracing::warn!(importer = ?importer, "Importer not found");
        return back_with_errors(
            ctx,
            &ValidationErrors::with_message("importer", lang::IMPORTER_NOT_FOUND),
        );
    };

    let Some(file) = file else {
        return back_with_errors(
            ctx,
            &ValidationErrors::with_message("file", lang::IMPORT_NO_FILE),
        );
    };

    match converter.import(&file) {
        Ok(rows) => {
            tracing::info!(importer = ?importer, rows, "Import completed");
            ctx.notify(Notification::success(lang::IMPORT_SUCCESS));
        }
        Err(ActionError::Validation(errors)) => return back_with_errors(ctx, &errors),
        Err(e) => {
            tracing::error!(importer = ?importer, "Import failed: {}", e);
            ctx.notify(Notification::danger(lang::IMPORT_FAILED).body(e.to_string()));
        }
    }

    DispatchResponse::redirect(Redirect::back(303), flash_notifications(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ERRORS_FLASH_KEY;
    use crate::session::SessionStore;
    use serde_json::json;

    fn sealed(ctx: &RequestContext, exporter: Option<&str>, file_name: &str) -> String {
        ctx.tokens()
            .seal(&ExportPayload {
                exporter: exporter.map(str::to_string),
                file_name: file_name.to_string(),
            })
            .unwrap()
    }

    fn upload() -> UploadedFile {
        UploadedFile {
            file_name: "posts.csv".to_string(),
            content_type: Some("text/csv".to_string()),
            bytes: b"title\nHello\n".to_vec(),
        }
    }

    #[test]
    fn test_writer_type_from_file_name() {
        assert_eq!(WriterType::from_file_name("export.csv"), WriterType::Csv);
        assert_eq!(WriterType::from_file_name("report.HTML"), WriterType::Html);
        assert_eq!(WriterType::from_file_name("noext"), WriterType::Xlsx);
        assert_eq!(WriterType::Tsv.extension(), "tsv");
    }

    #[test]
    fn test_export_payload_field_names() {
        let payload = ExportPayload {
            exporter: Some("posts".to_string()),
            file_name: "export.csv".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"exporter": "posts", "fileName": "export.csv"})
        );
    }

    #[test]
    fn test_export_runs_exporter() {
        let ctx = RequestContext::testing();
        let mut exporter = MockExporter::new();
        exporter
            .expect_export()
            .withf(|request| request.writer == WriterType::Csv && request.file_name == "posts.csv")
            .times(1)
            .returning(|request| Ok(ExportFile::new(request, b"a,b".to_vec())));
        ctx.services()
            .exporters()
            .register("posts", Arc::new(exporter) as Arc<dyn Exporter>);

        let token = sealed(&ctx, Some("posts"), "posts.csv");
        let file = export(&ctx, Some(&token)).unwrap();

        assert_eq!(file.content_type, "text/csv");
        assert_eq!(file.bytes, b"a,b".to_vec());
    }

    #[test]
    fn test_export_errors() {
        let ctx = RequestContext::testing();

        assert_eq!(export(&ctx, None).unwrap_err().status(), 400);
        assert_eq!(export(&ctx, Some("bogus")).unwrap_err().status(), 400);

        let token = sealed(&ctx, Some("missing"), "x.xlsx");
        let err = export(&ctx, Some(&token)).unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "Exporter 'missing' not found");
    }

    #[test]
    fn test_import_runs_importer() {
        let ctx = RequestContext::testing();
        let mut importer = MockImporter::new();
        importer
            .expect_import()
            .withf(|file| file.file_name == "posts.csv")
            .times(1)
            .returning(|_| Ok(1));
        ctx.services()
            .importers()
            .register("posts", Arc::new(importer) as Arc<dyn Importer>);

        let response = import(&ctx, Some("posts"), Some(upload()));

        assert_eq!(response.status(), 303);
        assert_eq!(response.notifications()[0].title, lang::IMPORT_SUCCESS);
    }

    #[test]
    fn test_import_unknown_importer_or_missing_file() {
        let ctx = RequestContext::testing();

        let response = import(&ctx, Some("missing"), Some(upload()));
        assert!(response.is_redirect());
        let errors = ctx.session().get(ERRORS_FLASH_KEY).unwrap();
        assert_eq!(errors["importer"][0], json!("Importer not found"));

        ctx.services()
            .importers()
            .register("posts", Arc::new(MockImporter::new()) as Arc<dyn Importer>);
        import(&ctx, Some("posts"), None);
        let errors = ctx.session().get(ERRORS_FLASH_KEY).unwrap();
        assert_eq!(errors["file"][0], json!("No file provided for import."));
    }

    #[test]
    fn test_import_failure_notifies() {
        let ctx = RequestContext::testing();
        let mut importer = MockImporter::new();
        importer
            .expect_import()
            .returning(|_| Err(ActionError::handler("bad header row")));
        ctx.services()
            .importers()
            .register("posts", Arc::new(importer) as Arc<dyn Importer>);

        let response = import(&ctx, Some("posts"), Some(upload()));

        let notification = &response.notifications()[0];
        assert_eq!(notification.title, lang::IMPORT_FAILED);
        assert_eq!(notification.body.as_deref(), Some("bad header row"));
    }
}
