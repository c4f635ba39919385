//! Import: upload a file to a registered importer.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use actionkit_core::Record;

use crate::action::{Action, ActionExtension};
use crate::context::RequestContext;
use crate::lang;
use crate::schema::Field;

use super::catalog_action;

/// MIME types accepted by default.
const DEFAULT_ACCEPTED_FILE_TYPES: [&str; 3] = [
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/csv",
];

#[derive(Debug, Clone)]
struct ImportSettings {
    importer: Option<String>,
    accepted_file_types: Vec<String>,
}

impl ImportSettings {
    fn form_schema(&self) -> Vec<Field> {
        let mut importer = Field::hidden("importer");
        if let Some(name) = &self.importer {
            importer = importer.with_default(name.clone());
        }
        vec![
            importer,
            Field::file_upload("file")
                .with_label(lang::IMPORT_FILE_FIELD)
                .with_required()
                .with_accepted_file_types(&self.accepted_file_types),
        ]
    }
}

impl ActionExtension for ImportSettings {
    fn before_serialize(&self, action: &mut Action, _record: Option<&Record>, ctx: &RequestContext) {
        action.set_url(ctx.config().routes.import.clone());
        action.set_form_schema(self.form_schema());
    }

    fn after_serialize(
        &self,
        _action: &Action,
        _record: Option<&Record>,
        _ctx: &RequestContext,
        out: &mut Map<String, Value>,
    ) {
        out.insert("data".into(), json!({ "importer": self.importer }));
        out.insert(
            "acceptedFileTypes".into(),
            json!(self.accepted_file_types),
        );
        // The UI only submits actions that report a backend action.
        out.insert("hasAction".into(), Value::Bool(true));
    }
}

/// Upload a spreadsheet to a named importer.
pub struct ImportAction {
    action: Action,
    settings: ImportSettings,
}

impl ImportAction {
    pub fn make() -> Self {
        Self::named("import")
    }

    pub fn named(name: &str) -> Self {
        Self {
            action: Action::make(name)
                .with_label(lang::IMPORT)
                .with_icon("upload")
                .with_color("gray")
                .requires_confirmation(true)
                .with_modal_heading(lang::IMPORT_TITLE)
                .with_modal_description(lang::IMPORT_DESCRIPTION)
                .with_modal_submit_label(lang::IMPORT),
            settings: ImportSettings {
                importer: None,
                accepted_file_types: DEFAULT_ACCEPTED_FILE_TYPES
                    .iter()
                    .map(|t| t.to_string())
                    .collect(),
            },
        }
    }

    /// Name of a registered importer.
    pub fn with_importer(mut self, importer: impl Into<String>) -> Self {
        self.settings.importer = Some(importer.into());
        self
    }

    pub fn with_accepted_file_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.accepted_file_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn importer(&self) -> Option<&str> {
        self.settings.importer.as_deref()
    }

    pub fn accepted_file_types(&self) -> &[String] {
        &self.settings.accepted_file_types
    }

    pub fn into_action(self) -> Action {
        self.action.with_extension(Arc::new(self.settings))
    }
}

catalog_action!(ImportAction);
