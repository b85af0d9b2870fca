//! Structural classification of webhook bodies.

use std::borrow::Cow;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use thiserror::Error;

use crate::domain::events::EventKind;

/// Outcome of classifying a request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// The body was empty.
    NoPayload,
    /// Valid JSON that matches none of the known event kinds.
    NotFound,
    /// A recognized GitLab event.
    Recognized(EventKind),
}

/// Why a non-empty body could not be classified.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The body is not JSON.
    #[error("body is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    /// A typed event kind did not match its expected field types.
    #[error("{kind} payload has an unexpected shape: {source}")]
    Shape {
        /// The kind the discriminator selected.
        kind: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

fn typed<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<Box<T>, ClassifyError> {
    serde_json::from_value(value)
        .map(Box::new)
        .map_err(|source| ClassifyError::Shape { kind, source })
}

fn is_confidential(value: &Value) -> bool {
    value.pointer("/object_attributes/confidential") == Some(&Value::Bool(true))
        || value.get("event_type").and_then(Value::as_str) == Some("confidential_issue")
}

/// Undoes one layer of transport encoding.
///
/// A body that is a JSON string whose content is itself JSON is returned as
/// that content. Any other body is returned untouched. Callers apply this
/// once per delivery; the result is never unescaped again.
#[must_use]
pub fn unescape_once(raw: &[u8]) -> Cow<'_, [u8]> {
    if raw.trim_ascii_start().first() != Some(&b'"') {
        return Cow::Borrowed(raw);
    }
    match serde_json::from_slice::<String>(raw) {
        Ok(inner) if serde_json::from_str::<IgnoredAny>(&inner).is_ok() => {
            Cow::Owned(inner.into_bytes())
        }
        _ => Cow::Borrowed(raw),
    }
}

/// Classifies a raw request body.
///
/// The body is decoded once; the kind is chosen by probing `object_kind`,
/// or `event_name` for system hooks that carry no `object_kind`.
///
/// # Errors
///
/// Returns `ClassifyError::Decode` for a non-empty body that is not JSON and
/// `ClassifyError::Shape` when a pipeline, build or job payload has fields of
/// the wrong type.
pub fn classify(raw: &[u8]) -> Result<Classification, ClassifyError> {
    if raw.is_empty() {
        return Ok(Classification::NoPayload);
    }

    let value: Value = serde_json::from_slice(raw).map_err(ClassifyError::Decode)?;

    let object_kind = value
        .get("object_kind")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let has_event_name = value.get("event_name").is_some_and(Value::is_string);

    let kind = match object_kind.as_deref() {
        Some("push") => EventKind::Push(value),
        Some("tag_push") => EventKind::Tag(value),
        Some("issue") if is_confidential(&value) => EventKind::ConfidentialIssue(value),
        Some("issue") => EventKind::Issue(value),
        Some("note") => EventKind::Comment(value),
        Some("merge_request") => EventKind::MergeRequest(value),
        Some("wiki_page") => EventKind::WikiPage(value),
        Some("pipeline") => EventKind::Pipeline(typed("pipeline", value)?),
        Some("build") => EventKind::Build(typed("build", value)?),
        Some("job") => EventKind::Job(typed("job", value)?),
        None if has_event_name => EventKind::SystemHook(value),
        _ => return Ok(Classification::NotFound),
    };

    Ok(Classification::Recognized(kind))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use webbook_test_support::fixtures;

    use super::*;

    fn classify_value(value: &Value) -> Classification {
        classify(value.to_string().as_bytes()).unwrap()
    }

    fn kind_name(value: &Value) -> &'static str {
        match classify_value(value) {
            Classification::Recognized(kind) => kind.name(),
            other => panic!("expected a recognized kind, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_is_no_payload() {
        assert_eq!(classify(b"").unwrap(), Classification::NoPayload);
    }

    #[test]
    fn test_non_json_body_is_decode_error() {
        let err = classify(b"object_kind=pipeline").unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(_)));
    }

    #[test]
    fn test_truncated_json_is_decode_error() {
        let err = classify(br#"{"object_kind": "pipeline""#).unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(_)));
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let err = classify(&[b'"', 0xff, 0xfe, b'"']).unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(_)));
    }

    #[test]
    fn test_pipeline_is_decoded_into_typed_event() {
        let Classification::Recognized(EventKind::Pipeline(pipeline)) =
            classify_value(&fixtures::concrete_pipeline_event())
        else {
            panic!("expected a pipeline");
        };

        let attributes = pipeline.object_attributes.unwrap();
        assert_eq!(attributes.id, Some(42));
        assert_eq!(attributes.status.as_deref(), Some("success"));
        assert_eq!(pipeline.builds.unwrap().len(), 1);
    }

    #[test]
    fn test_build_and_job_are_distinct_kinds() {
        let mut job = fixtures::build_event();
        job["object_kind"] = json!("job");

        assert_eq!(kind_name(&fixtures::build_event()), "build");
        assert_eq!(kind_name(&job), "job");
    }

    #[test]
    fn test_pass_through_kinds_are_recognized() {
        assert_eq!(kind_name(&fixtures::push_event()), "push");
        assert_eq!(kind_name(&json!({ "object_kind": "tag_push" })), "tag_push");
        assert_eq!(kind_name(&json!({ "object_kind": "note" })), "note");
        assert_eq!(
            kind_name(&json!({ "object_kind": "merge_request" })),
            "merge_request"
        );
        assert_eq!(kind_name(&json!({ "object_kind": "wiki_page" })), "wiki_page");
    }

    #[test]
    fn test_confidential_issue_is_split_from_issue() {
        assert_eq!(kind_name(&fixtures::issue_event(false)), "issue");
        assert_eq!(kind_name(&fixtures::issue_event(true)), "confidential_issue");
    }

    #[test]
    fn test_event_name_without_object_kind_is_system_hook() {
        assert_eq!(kind_name(&fixtures::system_hook_event()), "system_hook");
    }

    #[test]
    fn test_unknown_object_kind_is_not_found() {
        assert_eq!(
            classify_value(&fixtures::unrecognized_event()),
            Classification::NotFound
        );
    }

    #[test]
    fn test_non_object_json_is_not_found() {
        assert_eq!(classify(b"[1, 2, 3]").unwrap(), Classification::NotFound);
        assert_eq!(classify(b"\"pipeline\"").unwrap(), Classification::NotFound);
    }

    #[test]
    fn test_escaped_document_is_unescaped_once() {
        let document = fixtures::concrete_pipeline_event().to_string();
        let escaped = Value::String(document.clone()).to_string();

        let unescaped = unescape_once(escaped.as_bytes());

        assert_eq!(&*unescaped, document.as_bytes());
        assert!(matches!(
            classify(&unescaped).unwrap(),
            Classification::Recognized(EventKind::Pipeline(_))
        ));
    }

    #[test]
    fn test_twice_escaped_document_loses_only_one_layer() {
        let document = fixtures::concrete_pipeline_event().to_string();
        let once = Value::String(document).to_string();
        let twice = Value::String(once.clone()).to_string();

        let unescaped = unescape_once(twice.as_bytes());

        assert_eq!(&*unescaped, once.as_bytes());
        assert_eq!(classify(&unescaped).unwrap(), Classification::NotFound);
    }

    #[test]
    fn test_plain_bodies_are_not_unescaped() {
        let document = fixtures::push_event().to_string();

        assert!(matches!(unescape_once(document.as_bytes()), Cow::Borrowed(_)));
        assert!(matches!(unescape_once(b"\"pipeline\""), Cow::Borrowed(_)));
        assert!(matches!(unescape_once(b"\"{not json"), Cow::Borrowed(_)));
        assert!(matches!(unescape_once(b""), Cow::Borrowed(_)));
    }

    #[test]
    fn test_pipeline_with_wrong_field_type_is_shape_error() {
        let body = json!({
            "object_kind": "pipeline",
            "object_attributes": { "id": "forty-two" }
        });

        let err = classify(body.to_string().as_bytes()).unwrap_err();

        assert!(matches!(err, ClassifyError::Shape { kind: "pipeline", .. }));
    }

    #[test]
    fn test_pipeline_with_null_sections_is_accepted() {
        let body = json!({
            "object_kind": "pipeline",
            "object_attributes": null,
            "project": null,
            "builds": null
        });

        assert!(matches!(
            classify_value(&body),
            Classification::Recognized(EventKind::Pipeline(_))
        ));
    }
}
