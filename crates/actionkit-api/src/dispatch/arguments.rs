//! Argument reconstruction for standalone handlers.
//!
//! The submitted data may carry a single `record` (row actions) or a list
//! of `ids` (bulk actions). Each declared handler parameter is matched, in
//! order, against:
//!
//! 1. `Get` / `Set` accessors over the data
//! 2. a parameter named `data`
//! 3. a parameter named `record`
//! 4. a parameter named `records` or `ids`, when ids were submitted
//! 5. the first untyped parameter: the ids if present, else the record
//! 6. any later untyped parameter: the data
//! 7. anything else: null
//!
//! Rule 5 only applies while nothing has been resolved yet. This positional
//! fallback exists for older handlers; new handlers should name their
//! parameters.

use serde_json::{Map, Value};

use actionkit_core::{Record, RecordKey, Selection};

use crate::context::RequestContext;
use crate::handler::{Argument, Arguments, Get, Param, ParamKind, Set};

/// Record and selection extracted from submitted data.
#[derive(Debug, Default)]
pub struct Hydrated {
    pub record: Option<Record>,
    pub selection: Option<Selection>,
}

/// Extract `record` and `ids` from the data.
///
/// When the data also names a `model`, the record is reloaded from the
/// store by its key and the ids are loaded as records.
pub fn hydrate(data: &Map<String, Value>, ctx: &RequestContext) -> Hydrated {
    let model = data.get("model").and_then(Value::as_str);

    let record = data
        .get("record")
        .and_then(Record::from_value)
        .map(|record| match (model, record.key()) {
            (Some(model), Some(key)) => ctx.records().find(model, &key).unwrap_or_else(|| {
                tracing::debug!(model = %model, key = %key, "Record not in store, using submitted attributes");
                record
            }),
            _ => record,
        });

    let selection = data.get("ids").and_then(Value::as_array).map(|ids| {
        let keys: Vec<RecordKey> = ids.iter().cloned().map(RecordKey::from).collect();
        match model {
            Some(model) => Selection::Records(ctx.records().find_many(model, &keys)),
            None => Selection::Keys(keys),
        }
    });

    Hydrated { record, selection }
}

/// Resolve handler arguments from declared parameters.
pub fn resolve(params: &[Param], data: &Map<String, Value>, hydrated: &Hydrated) -> Arguments {
    let mut args: Vec<Argument> = Vec::with_capacity(params.len());

    for param in params {
        let arg = match &param.kind {
            ParamKind::Get => Argument::Get(Get::new(data.clone())),
            ParamKind::Set => Argument::Set(Set::new(data.clone())),
            _ if param.has_name("data") => Argument::Data(data.clone()),
            _ if param.has_name("record") => hydrated.record.as_ref().into(),
            _ if (param.has_name("records") || param.has_name("ids"))
                && hydrated.selection.is_some() =>
            {
                selection_argument(hydrated)
            }
            _ if param.is_untyped() && args.is_empty() => match &hydrated.selection {
                Some(_) => selection_argument(hydrated),
                None => hydrated.record.as_ref().into(),
            },
            _ if param.is_untyped() => Argument::Data(data.clone()),
            _ => Argument::Null,
        };
        args.push(arg);
    }

    Arguments::new(args)
}

fn selection_argument(hydrated: &Hydrated) -> Argument {
    match &hydrated.selection {
        Some(selection) => Argument::Selection(selection.clone()),
        None => Argument::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::MemoryRecordStore;
    use crate::records::RecordStore;
    use crate::services::ActionServices;
    use crate::session::MemorySession;
    use actionkit_core::ActionsConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_first_untyped_prefers_ids() {
        let ctx = RequestContext::testing();
        let data = map(json!({"ids": [1, 2, 3], "record": {"id": 9}}));
        let hydrated = hydrate(&data, &ctx);

        let args = resolve(&[Param::positional(), Param::positional()], &data, &hydrated);

        assert_eq!(
            args.at(0).as_selection().unwrap().keys(),
            vec![RecordKey::from(1), RecordKey::from(2), RecordKey::from(3)]
        );
        assert_eq!(args.at(1).as_data(), Some(&data));
    }

    #[test]
    fn test_first_untyped_falls_back_to_record() {
        let ctx = RequestContext::testing();
        let data = map(json!({"record": {"id": 9, "title": "Post"}}));
        let hydrated = hydrate(&data, &ctx);

        let args = resolve(&[Param::positional()], &data, &hydrated);
        let record = args.at(0).as_record().unwrap();
        assert_eq!(record.key(), Some(RecordKey::from(9)));
    }

    #[test]
    fn test_named_parameters() {
        let ctx = RequestContext::testing();
        let data = map(json!({"ids": [4], "record": {"id": 9}}));
        let hydrated = hydrate(&data, &ctx);

        let params = [Param::named("data"), Param::named("record"), Param::named("records")];
        let args = resolve(&params, &data, &hydrated);

        assert!(args.at(0).as_data().is_some());
        assert!(args.at(1).as_record().is_some());
        assert_eq!(args.at(2).as_selection().unwrap().len(), 1);
    }

    #[test]
    fn test_ids_name_without_ids_falls_through() {
        let ctx = RequestContext::testing();
        let data = map(json!({"record": {"id": 9}}));
        let hydrated = hydrate(&data, &ctx);

        let args = resolve(&[Param::named("ids")], &data, &hydrated);
        assert!(args.at(0).as_record().is_some());
    }

    #[test]
    fn test_accessors_and_unknown_types() {
        let ctx = RequestContext::testing();
        let data = map(json!({"title": "Hello"}));
        let hydrated = hydrate(&data, &ctx);

        let params = [
            Param::get(),
            Param::set(),
            Param::typed("mailer", "Mailer"),
            Param::positional(),
        ];
        let args = resolve(&params, &data, &hydrated);

        assert!(matches!(args.at(0), Argument::Get(get) if get.str("title") == Some("Hello")));
        assert!(matches!(args.at(1), Argument::Set(_)));
        assert!(args.at(2).is_null());
        assert_eq!(args.at(3).as_data(), Some(&data));
    }

    #[test]
    fn test_hydrates_from_store_when_model_given() {
        let store = Arc::new(MemoryRecordStore::new());
        let saved = store
            .insert("post", map(json!({"title": "Stored"})))
            .unwrap();
        let key = saved.key().unwrap();

        let services = ActionServices::new(ActionsConfig::default())
            .unwrap()
            .with_records(store);
        let ctx = RequestContext::new(Arc::new(services), Arc::new(MemorySession::new()));

        let data = map(json!({
            "model": "post",
            "record": {"id": key.as_value().clone()},
            "ids": [key.as_value().clone(), 999]
        }));
        let hydrated = hydrate(&data, &ctx);

        assert_eq!(
            hydrated.record.unwrap().get("title"),
            Some(&json!("Stored"))
        );
        assert!(matches!(hydrated.selection, Some(Selection::Records(ref r)) if r.len() == 1));
    }
}
