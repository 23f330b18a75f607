//! Property tests for the response envelope and log templates.

use std::sync::Arc;

use heaven::services::{InMemoryStore, LogMessages, Model, Service};
use heaven::template::{format_log_message, LogSubject};
use heaven::{
    FinishedResponse, JsonFormatter, JsonResponse, LogLevel, RecordingSink, RestFormatter,
    RestResponse, Settings,
};
use http::StatusCode;
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

struct Fixed {
    service: String,
    objects: String,
}

impl LogSubject for Fixed {
    fn subject(&self) -> String {
        self.service.clone()
    }

    fn objects(&self) -> String {
        self.objects.clone()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Note {
    id: Option<i64>,
    body: String,
}

impl Model for Note {
    const NAME: &'static str = "Note";
    const FIELDS: &'static [&'static str] = &["id", "body"];

    fn pk(&self) -> Option<i64> {
        self.id
    }

    fn set_pk(&mut self, pk: i64) {
        self.id = Some(pk);
    }
}

// Strategy: envelope keys
fn arb_verb() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_]{1,12}").unwrap()
}

// Strategy: JSON leaves a handler might return
fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,20}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
    ]
}

// Strategy: flat JSON objects
fn arb_object() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,8}", arb_leaf(), 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}

// Strategy: templates without placeholder tokens
fn arb_plain_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,:]{0,40}"
}

proptest! {
    /// Raw text is wrapped as `{verb: text}` and exactly one info message is logged.
    #[test]
    fn raw_text_is_wrapped_under_verb(verb in arb_verb(), text in "[ -~]{0,40}") {
        let sink = RecordingSink::shared();
        let mut settings = Settings::default().with_logger(sink.clone());
        settings.responses.default_response_verb = verb.clone();
        let formatter = JsonFormatter::new(&settings.responses).unwrap();

        let response = formatter
            .log_response_as_info(text.as_str(), "wrapped", StatusCode::OK)
            .unwrap();

        prop_assert_eq!(response.json().unwrap(), json!({ verb: text }));
        prop_assert_eq!(sink.count(LogLevel::Info), 1);
        prop_assert_eq!(sink.count(LogLevel::Error), 0);
    }

    /// Raw objects are wrapped whole, never merged into the envelope.
    #[test]
    fn raw_object_is_nested_not_merged(object in arb_object()) {
        let sink = RecordingSink::shared();
        let settings = Settings::default().with_logger(sink.clone());
        let formatter = RestFormatter::new(&settings.responses).unwrap();

        let response = formatter
            .log_response_as_error(object.clone(), "nested", StatusCode::BAD_REQUEST)
            .unwrap();

        prop_assert_eq!(response.data(), &json!({ "detail": Value::Object(object) }));
        prop_assert_eq!(sink.messages(LogLevel::Error), vec!["nested".to_string()]);
    }

    /// A finished response holding a mapping comes back identical.
    #[test]
    fn finished_mapping_is_returned_unchanged(object in arb_object(), code in 200u16..600) {
        let status = StatusCode::from_u16(code).unwrap();
        let settings = Settings::default().with_logger(RecordingSink::shared());

        let json_formatter = JsonFormatter::new(&settings.responses).unwrap();
        let original = JsonResponse::new(&Value::Object(object.clone()))
            .unwrap()
            .with_status(status);
        let returned = json_formatter
            .log_response_as_info(original.clone(), "json", StatusCode::OK)
            .unwrap();
        prop_assert_eq!(&returned, &original);
        prop_assert_eq!(returned.status(), status);

        let rest_formatter = RestFormatter::new(&settings.responses).unwrap();
        let original = RestResponse::new(Value::Object(object)).with_status(status);
        let returned = rest_formatter
            .log_response_as_info(original.clone(), "rest", StatusCode::OK)
            .unwrap();
        prop_assert_eq!(returned, original);
    }

    /// Lists are never accepted as finished JSON or REST responses.
    #[test]
    fn finished_list_is_rejected(items in prop::collection::vec(arb_leaf(), 0..5)) {
        let sink = RecordingSink::shared();
        let settings = Settings::default().with_logger(sink.clone());
        let list = Value::Array(items);

        let rest = RestFormatter::new(&settings.responses).unwrap();
        prop_assert!(rest
            .log_response_as_info(RestResponse::new(list.clone()), "rest", StatusCode::OK)
            .is_err());

        let json_formatter = JsonFormatter::new(&settings.responses).unwrap();
        prop_assert!(json_formatter
            .log_response_as_info(JsonResponse::new_unsafe(&list), "json", StatusCode::OK)
            .is_err());

        // Logged even though rejected.
        prop_assert_eq!(sink.count(LogLevel::Info), 2);
    }

    /// Text without tokens is left alone, with or without a subject.
    #[test]
    fn plain_templates_are_unchanged(template in arb_plain_text()) {
        let subject = Fixed { service: "S".into(), objects: "O".into() };
        prop_assert_eq!(format_log_message(&template, Some(&subject)), template.clone());
        prop_assert_eq!(format_log_message(&template, None), template);
    }

    /// Every token is replaced; replacement text is not scanned again.
    #[test]
    fn tokens_are_replaced_once(
        prefix in arb_plain_text(),
        suffix in arb_plain_text(),
        service in "[ -~]{0,20}",
        objects in "[ -~]{0,20}",
    ) {
        let template = format!("{prefix}$service$ {suffix}$objects$$result$");
        let subject = Fixed { service: service.clone(), objects: objects.clone() };

        let message = format_log_message(&template, Some(&subject));
        prop_assert_eq!(message, format!("{prefix}{service} {suffix}{objects}{objects}"));
    }

    /// Without a subject the template is kept verbatim, placeholders included.
    #[test]
    fn no_subject_keeps_placeholders(prefix in arb_plain_text()) {
        let template = format!("{prefix} $service$ $objects$");
        prop_assert_eq!(format_log_message(&template, None), template);
    }

    /// A successful call logs its info message once and leaves the caller's handle alone.
    #[test]
    fn successful_call_logs_once(bodies in prop::collection::vec("[a-z]{1,10}", 0..8)) {
        let store = Arc::new(InMemoryStore::<Note>::new());
        let sink = RecordingSink::shared();
        let service = Service::<Note>::builder("NoteService", store)
            .logger(sink.clone())
            .build(&Settings::default())
            .unwrap();

        let notes: Vec<Note> = bodies
            .iter()
            .map(|body| Note { id: None, body: body.clone() })
            .collect();
        let count = notes.len();

        let next = service
            .call(
                LogMessages::new().info("$service$").error("failed"),
                move |_| Ok(notes.into()),
            )
            .unwrap()
            .unwrap();

        prop_assert_eq!(next.objects().len(), count);
        prop_assert_eq!(sink.messages(LogLevel::Info), vec![next.to_string()]);
        prop_assert_eq!(service.to_string(), "{NoteService <Manager: Note>}");
    }
}
