//! Action handlers.
//!
//! A handler is a closure plus the list of parameters it declares. The
//! parameter list drives argument resolution at dispatch time, so the
//! same handler can be invoked with a single record, a bulk selection,
//! or form accessors depending on what it asks for.
//!
//! Handlers are stored in the session under their action id when an
//! action is serialized, and looked up again when the UI submits the
//! action token.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use actionkit_core::{ActionOutcome, ActionResult, Record, Selection};

use crate::context::RequestContext;

// =============================================================================
// Parameters
// =============================================================================

/// Declared type of a handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// No declared type; resolved by name or position.
    Untyped,
    /// Read accessor over the submitted data.
    Get,
    /// Write accessor over the submitted data.
    Set,
    /// Some other type the dispatcher does not know how to build.
    Other(String),
}

/// A declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Option<String>,
    pub kind: ParamKind,
}

impl Param {
    /// An untyped parameter with a name (`record`, `data`, `ids`, ...).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: ParamKind::Untyped,
        }
    }

    /// An untyped, unnamed parameter resolved purely by position.
    pub fn positional() -> Self {
        Self {
            name: None,
            kind: ParamKind::Untyped,
        }
    }

    pub fn get() -> Self {
        Self {
            name: Some("get".to_string()),
            kind: ParamKind::Get,
        }
    }

    pub fn set() -> Self {
        Self {
            name: Some("set".to_string()),
            kind: ParamKind::Set,
        }
    }

    /// A parameter of an unrecognized type. Always receives `Argument::Null`.
    pub fn typed(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: ParamKind::Other(ty.into()),
        }
    }

    pub(crate) fn is_untyped(&self) -> bool {
        self.kind == ParamKind::Untyped
    }

    pub(crate) fn has_name(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

// =============================================================================
// Form Accessors
// =============================================================================

/// Look up a dot-separated path in a JSON map.
fn lookup<'a>(data: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = data.get(first)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Read accessor over submitted form data.
#[derive(Debug, Clone, PartialEq)]
pub struct Get {
    data: Map<String, Value>,
}

impl Get {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Get a value by dot path (e.g. `address.city`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.data, path)
    }

    /// Get a string value by dot path.
    pub fn str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }
}

/// Write accessor over submitted form data.
///
/// Writes are merged back into the data flashed after a standalone action.
#[derive(Debug)]
pub struct Set {
    state: Mutex<SetState>,
}

#[derive(Debug)]
struct SetState {
    data: Map<String, Value>,
    touched: bool,
}

impl Set {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            state: Mutex::new(SetState {
                data,
                touched: false,
            }),
        }
    }

    /// Set a top-level value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let mut state = self.state.lock();
        state.data.insert(key.into(), value.into());
        state.touched = true;
    }

    /// Whether any value was written.
    pub fn is_touched(&self) -> bool {
        self.state.lock().touched
    }

    /// Snapshot of the current data.
    pub fn values(&self) -> Map<String, Value> {
        self.state.lock().data.clone()
    }
}

// =============================================================================
// Arguments
// =============================================================================

/// A resolved argument passed to a handler.
#[derive(Debug)]
pub enum Argument {
    Get(Get),
    Set(Set),
    Data(Map<String, Value>),
    Record(Record),
    Selection(Selection),
    Null,
}

impl Argument {
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Argument::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_selection(&self) -> Option<&Selection> {
        match self {
            Argument::Selection(selection) => Some(selection),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&Map<String, Value>> {
        match self {
            Argument::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Argument::Null)
    }
}

impl From<Option<&Record>> for Argument {
    fn from(record: Option<&Record>) -> Self {
        match record {
            Some(record) => Argument::Record(record.clone()),
            None => Argument::Null,
        }
    }
}

static NULL_ARGUMENT: Argument = Argument::Null;

/// Positional arguments for one handler invocation.
#[derive(Debug, Default)]
pub struct Arguments {
    args: Vec<Argument>,
}

impl Arguments {
    pub fn new(args: Vec<Argument>) -> Self {
        Self { args }
    }

    /// Get the argument at a position.
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.args.get(index)
    }

    /// Get the argument at a position, treating missing as `Null`.
    pub fn at(&self, index: usize) -> &Argument {
        self.args.get(index).unwrap_or(&NULL_ARGUMENT)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.args.iter()
    }

    /// Data written through a `Set` accessor, if any.
    pub fn written_data(&self) -> Option<Map<String, Value>> {
        self.args.iter().find_map(|arg| match arg {
            Argument::Set(set) if set.is_touched() => Some(set.values()),
            _ => None,
        })
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Signature of a handler closure.
pub type HandlerFn =
    dyn Fn(&RequestContext, &Arguments) -> ActionResult<ActionOutcome> + Send + Sync;

/// A closure bound to an action, with its declared parameters.
#[derive(Clone)]
pub struct Handler {
    params: Vec<Param>,
    func: Arc<HandlerFn>,
}

impl Handler {
    /// Create a handler from a parameter list and a closure.
    pub fn new<F>(params: Vec<Param>, func: F) -> Self
    where
        F: Fn(&RequestContext, &Arguments) -> ActionResult<ActionOutcome> + Send + Sync + 'static,
    {
        Self {
            params,
            func: Arc::new(func),
        }
    }

    /// A handler taking no arguments.
    pub fn no_args<F>(func: F) -> Self
    where
        F: Fn(&RequestContext) -> ActionResult<ActionOutcome> + Send + Sync + 'static,
    {
        Self::new(Vec::new(), move |ctx, _| func(ctx))
    }

    /// A handler declared as `(record, data)`.
    pub fn record_and_data<F>(func: F) -> Self
    where
        F: Fn(&RequestContext, Option<&Record>, &Map<String, Value>) -> ActionResult<ActionOutcome>
            + Send
            + Sync
            + 'static,
    {
        Self::new(
            vec![Param::named("record"), Param::named("data")],
            move |ctx, args| {
                let empty = Map::new();
                let data = args.at(1).as_data().unwrap_or(&empty);
                func(ctx, args.at(0).as_record(), data)
            },
        )
    }

    /// A handler declared as `(ids, data)` for bulk actions.
    pub fn bulk<F>(func: F) -> Self
    where
        F: Fn(&RequestContext, &Selection, &Map<String, Value>) -> ActionResult<ActionOutcome>
            + Send
            + Sync
            + 'static,
    {
        Self::new(
            vec![Param::named("ids"), Param::named("data")],
            move |ctx, args| {
                let empty_data = Map::new();
                let empty_selection = Selection::default();
                let selection = args.at(0).as_selection().unwrap_or(&empty_selection);
                let data = args.at(1).as_data().unwrap_or(&empty_data);
                func(ctx, selection, data)
            },
        )
    }

    /// Get the declared parameters.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Invoke the handler.
    pub fn call(&self, ctx: &RequestContext, args: &Arguments) -> ActionResult<ActionOutcome> {
        (self.func)(ctx, args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_get_dot_paths() {
        let get = Get::new(map(json!({
            "name": "Ada",
            "address": {"city": "London"},
            "tags": ["a", "b"]
        })));

        assert_eq!(get.str("name"), Some("Ada"));
        assert_eq!(get.str("address.city"), Some("London"));
        assert_eq!(get.str("tags.1"), Some("b"));
        assert!(get.get("address.zip").is_none());
    }

    #[test]
    fn test_set_tracks_writes() {
        let set = Set::new(map(json!({"name": "Ada"})));
        assert!(!set.is_touched());

        set.set("slug", "ada");
        assert!(set.is_touched());
        assert_eq!(set.values().get("slug"), Some(&json!("ada")));

        let args = Arguments::new(vec![Argument::Set(set)]);
        assert_eq!(
            args.written_data().and_then(|d| d.get("name").cloned()),
            Some(json!("Ada"))
        );
    }

    #[test]
    fn test_arguments_missing_positions_are_null() {
        let args = Arguments::new(vec![Argument::Data(Map::new())]);
        assert!(args.at(0).as_data().is_some());
        assert!(args.at(5).is_null());
    }

    #[test]
    fn test_helper_params() {
        let handler = Handler::bulk(|_, _, _| Ok(ActionOutcome::Empty));
        assert_eq!(
            handler.params(),
            &[Param::named("ids"), Param::named("data")]
        );

        let handler = Handler::no_args(|_| Ok(ActionOutcome::Empty));
        assert!(handler.params().is_empty());
    }
}
