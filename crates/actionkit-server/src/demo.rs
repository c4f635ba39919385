//! A `posts` resource wired up for local runs.
//!
//! Registers one component showing the built-in catalog, a standalone
//! `publish` action, bulk actions, and a CSV exporter/importer pair.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use actionkit_api::catalog::{
    CreateAction, DeleteAction, DeleteBulkAction, EditAction, ExportAction, ForceDeleteAction,
    ForceDeleteBulkAction, ImportAction, ReplicateAction, RestoreAction, RestoreBulkAction,
    ViewAction,
};
use actionkit_api::{
    Action, ActionServices, BulkActionGroup, Component, ExportFile, ExportRequest, Exporter,
    Importer, MemoryRecordStore, RecordStore, RequestContext, Resource, ResourceDefinition,
    UploadedFile, WriterType,
};
use actionkit_core::{
    ActionError, ActionOutcome, ActionResult, ActionsConfig, Notification, ValidationErrors,
};

use crate::error::ServerResult;

/// Name of the demo component.
pub const POSTS_PAGE: &str = "posts.index";

/// Model name of demo records.
pub const POST_MODEL: &str = "post";

/// Columns written by the exporter.
const COLUMNS: [&str; 3] = ["id", "title", "status"];

struct PostsPage {
    resource: Arc<dyn Resource>,
}

impl Component for PostsPage {
    fn name(&self) -> &str {
        POSTS_PAGE
    }

    fn resource(&self) -> Option<Arc<dyn Resource>> {
        Some(Arc::clone(&self.resource))
    }

    fn actions(&self, _ctx: &RequestContext) -> Vec<Action> {
        vec![
            CreateAction::make().into(),
            EditAction::make().into(),
            ViewAction::make().into(),
            ReplicateAction::make()
                .exclude_attributes(["status"])
                .before_replica_saved(|replica, _| {
                    replica.set("status", json!("draft"));
                })
                .into(),
            DeleteAction::make().into(),
            RestoreAction::make().into(),
            ForceDeleteAction::make().into(),
            ExportAction::make().with_exporter("posts").csv().into(),
            ImportAction::make()
                .with_importer("posts")
                .with_accepted_file_types(["text/csv"])
                .into(),
            publish_action(),
        ]
    }

    fn bulk_actions(&self, _ctx: &RequestContext) -> Vec<BulkActionGroup> {
        vec![BulkActionGroup::make(vec![
            DeleteBulkAction::make().model(POST_MODEL).into(),
            RestoreBulkAction::make().model(POST_MODEL).into(),
            ForceDeleteBulkAction::make().model(POST_MODEL).into(),
        ])]
    }
}

/// Standalone action marking the submitted record as published.
fn publish_action() -> Action {
    Action::make("publish")
        .with_icon("Send")
        .with_color("success")
        .with_stable_id("posts_publish")
        .action(|ctx, record, _data| {
            let Some(record) = record else {
                let errors = ValidationErrors::with_message("record", "Select a post to publish");
                return Err(errors.into());
            };
            let title = record
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("Post")
                .to_string();

            tracing::info!(key = ?record.key(), "Publishing post");
            ctx.notify(Notification::success("Published").body(format!("{} is live", title)));
            Ok(ActionOutcome::Value(json!({ "status": "published" })))
        })
}

// =============================================================================
// CSV transfer
// =============================================================================

/// Writes all live posts as CSV.
struct PostsExporter {
    records: Arc<MemoryRecordStore>,
}

impl Exporter for PostsExporter {
    fn export(&self, request: &ExportRequest) -> ActionResult<ExportFile> {
        if request.writer != WriterType::Csv {
            return Err(ActionError::handler(format!(
                "Unsupported export format: {}",
                request.writer.extension()
            )));
        }

        let mut csv = COLUMNS.join(",");
        csv.push('\n');
        for record in self.records.all(POST_MODEL) {
            if record.is_trashed() {
                continue;
            }
            let row: Vec<String> = COLUMNS
                .iter()
                .map(|column| match record.get(column) {
                    Some(Value::String(s)) => s.replace(',', " "),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                })
                .collect();
            csv.push_str(&row.join(","));
            csv.push('\n');
        }
        Ok(ExportFile::new(request, csv.into_bytes()))
    }
}

/// Inserts one post per CSV row, using the header row as attribute names.
struct PostsImporter {
    records: Arc<MemoryRecordStore>,
}

impl Importer for PostsImporter {
    fn import(&self, file: &UploadedFile) -> ActionResult<usize> {
        let text = std::str::from_utf8(&file.bytes)
            .map_err(|_| ValidationErrors::with_message("file", "The file must be UTF-8 CSV"))?;

        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let Some(header) = lines.next() else {
            return Err(ValidationErrors::with_message("file", "The file is empty").into());
        };
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();

        let mut count = 0;
        for line in lines {
            let attributes: Map<String, Value> = columns
                .iter()
                .zip(line.split(','))
                .filter(|(column, _)| **column != "id")
                .map(|(column, value)| (column.to_string(), json!(value.trim())))
                .collect();
            self.records.insert(POST_MODEL, attributes)?;
            count += 1;
        }
        Ok(count)
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Build services with the demo resource, a few posts and the CSV converters.
pub fn services(config: ActionsConfig) -> ServerResult<ActionServices> {
    let records = Arc::new(MemoryRecordStore::new());
    for (title, status) in [("Hello world", "published"), ("Draft notes", "draft")] {
        records.insert(POST_MODEL, json_map(json!({ "title": title, "status": status })))?;
    }

    let store: Arc<dyn RecordStore> = records.clone();
    let services = ActionServices::new(config)?.with_records(store);

    let resource = ResourceDefinition::new("posts", POST_MODEL);
    services
        .components()
        .add(Arc::new(PostsPage {
            resource: Arc::new(resource),
        }))?;
    services.exporters().register(
        "posts",
        Arc::new(PostsExporter {
            records: Arc::clone(&records),
        }),
    );
    services
        .importers()
        .register("posts", Arc::new(PostsImporter { records }));

    tracing::info!("Registered demo component: {}", POSTS_PAGE);
    Ok(services)
}

fn json_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
