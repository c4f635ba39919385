//! Bulk actions and groups.

use std::ops::Deref;

use serde_json::{json, Map, Value};

use actionkit_core::{ActionOutcome, ActionResult, Selection};

use crate::action::Action;
use crate::context::RequestContext;
use crate::handler::{Argument, Arguments};
use crate::lang;

/// An action that operates on a selection of records.
///
/// Confirmation is required by default. The selection is only set while
/// executing, never while serializing.
#[derive(Debug, Clone)]
pub struct BulkAction {
    action: Action,
    selected: Selection,
    deselect_after_completion: bool,
    view_flags: Map<String, Value>,
}

impl BulkAction {
    pub fn make(name: impl Into<String>) -> Self {
        Self::new(Action::make(name))
    }

    /// Wrap an action, turning on confirmation.
    pub fn new(action: Action) -> Self {
        Self {
            action: action.requires_confirmation(true),
            selected: Selection::default(),
            deselect_after_completion: false,
            view_flags: Map::new(),
        }
    }

    /// Apply builder methods to the wrapped action.
    pub fn configure(mut self, f: impl FnOnce(Action) -> Action) -> Self {
        self.action = f(self.action);
        self
    }

    pub fn deselect_records_after_completion(mut self, value: bool) -> Self {
        self.deselect_after_completion = value;
        self
    }

    /// Add a flag to the serialized view.
    pub fn with_view_flag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.view_flags.insert(key.into(), value.into());
        self
    }

    pub fn should_deselect_records_after_completion(&self) -> bool {
        self.deselect_after_completion
    }

    /// Records passed to the last `execute_for_records` call.
    pub fn selected_records(&self) -> &Selection {
        &self.selected
    }

    pub fn action_mut(&mut self) -> &mut Action {
        &mut self.action
    }

    pub fn into_action(self) -> Action {
        self.action
    }

    /// Remember the selection, then call the handler with `(ids, data)`.
    pub fn execute_for_records(
        &mut self,
        records: impl Into<Selection>,
        data: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> ActionResult<ActionOutcome> {
        self.selected = records.into();

        let Some(handler) = self.action.handler() else {
            return Ok(ActionOutcome::Empty);
        };
        let args = Arguments::new(vec![
            Argument::Selection(self.selected.clone()),
            Argument::Data(data.clone()),
        ]);
        handler.call(ctx, &args)
    }

    pub fn to_array(&mut self, ctx: &RequestContext) -> Map<String, Value> {
        let mut out = self.action.to_array(ctx);
        out.insert("isBulkAction".into(), Value::Bool(true));
        out.insert(
            "deselectRecordsAfterCompletion".into(),
            Value::Bool(self.deselect_after_completion),
        );
        for (key, value) in &self.view_flags {
            out.insert(key.clone(), value.clone());
        }
        out
    }
}

impl Deref for BulkAction {
    type Target = Action;

    fn deref(&self) -> &Action {
        &self.action
    }
}

impl From<BulkAction> for Action {
    fn from(bulk: BulkAction) -> Self {
        bulk.action
    }
}

/// A labelled group of bulk actions.
#[derive(Debug, Clone, Default)]
pub struct BulkActionGroup {
    actions: Vec<BulkAction>,
    label: Option<String>,
    icon: Option<String>,
    color: Option<String>,
}

impl BulkActionGroup {
    pub fn make(actions: Vec<BulkAction>) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn actions(&self) -> &[BulkAction] {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut Vec<BulkAction> {
        &mut self.actions
    }

    /// Serialize the group. Unlike actions, `null` values are kept.
    pub fn to_array(&mut self, ctx: &RequestContext) -> Value {
        let actions: Vec<Value> = self
            .actions
            .iter_mut()
            .map(|action| Value::Object(action.to_array(ctx)))
            .collect();

        json!({
            "type": "bulk-action-group",
            "label": self.label.as_deref().unwrap_or(lang::BULK_ACTIONS),
            "icon": self.icon,
            "color": self.color,
            "actions": actions,
        })
    }
}
