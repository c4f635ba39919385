//! Export: download through a registered exporter.

use std::sync::Arc;

use serde_json::{Map, Value};

use actionkit_core::{ActionError, ActionOutcome, ActionResult, Record, Redirect};

use crate::action::{Action, ActionExtension};
use crate::context::RequestContext;
use crate::lang;
use crate::transfer::{ExportPayload, WriterType};

use super::catalog_action;

#[derive(Debug, Clone, Default)]
struct ExportSettings {
    exporter: Option<String>,
    file_name: Option<String>,
    writer: WriterType,
}

impl ExportSettings {
    /// The explicit file name, or `export-{timestamp}.{ext}`.
    fn file_name(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => format!(
                "export-{}.{}",
                chrono::Local::now().format("%Y-%m-%d-%H%M%S"),
                self.writer.extension()
            ),
        }
    }

    /// Export route with a sealed `{exporter, fileName}` token.
    fn url(&self, ctx: &RequestContext) -> ActionResult<String> {
        let payload = ExportPayload {
            exporter: self.exporter.clone(),
            file_name: self.file_name(),
        };
        let token = ctx
            .tokens()
            .seal(&payload)
            .map_err(|e| ActionError::handler(e.to_string()))?;
        Ok(format!("{}?token={}", ctx.config().routes.export, token))
    }
}

impl ActionExtension for ExportSettings {
    fn before_serialize(&self, action: &mut Action, _record: Option<&Record>, ctx: &RequestContext) {
        match self.url(ctx) {
            Ok(url) => {
                action.set_url(url);
                action.set_open_url_in_new_tab(true);
                action.set_method("GET");
            }
            Err(e) => tracing::warn!("Failed to build export URL: {}", e),
        }
    }

    fn execute(
        &self,
        _action: &Action,
        _record: Option<&Record>,
        _data: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Option<ActionResult<ActionOutcome>> {
        Some(self.url(ctx).map(|url| Redirect::to(url).into()))
    }
}

/// Download records through a named exporter.
pub struct ExportAction {
    action: Action,
    settings: ExportSettings,
}

impl ExportAction {
    pub fn make() -> Self {
        Self::named("export")
    }

    pub fn named(name: &str) -> Self {
        Self {
            action: Action::make(name)
                .with_label(lang::EXPORT)
                .with_icon("download")
                .with_color("gray")
                .with_method("POST"),
            settings: ExportSettings::default(),
        }
    }

    /// Name of a registered exporter.
    pub fn with_exporter(mut self, exporter: impl Into<String>) -> Self {
        self.settings.exporter = Some(exporter.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.settings.file_name = Some(file_name.into());
        self
    }

    pub fn with_writer_type(mut self, writer: WriterType) -> Self {
        self.settings.writer = writer;
        self
    }

    /// Use the first of several formats.
    pub fn formats(self, formats: &[WriterType]) -> Self {
        match formats.first() {
            Some(writer) => self.with_writer_type(*writer),
            None => self,
        }
    }

    pub fn xlsx(self) -> Self {
        self.with_writer_type(WriterType::Xlsx)
    }

    pub fn csv(self) -> Self {
        self.with_writer_type(WriterType::Csv)
    }

    pub fn exporter(&self) -> Option<&str> {
        self.settings.exporter.as_deref()
    }

    pub fn writer_type(&self) -> WriterType {
        self.settings.writer
    }

    pub fn file_name(&self) -> String {
        self.settings.file_name()
    }

    pub fn into_action(self) -> Action {
        self.action.with_extension(Arc::new(self.settings))
    }
}

catalog_action!(ExportAction);
