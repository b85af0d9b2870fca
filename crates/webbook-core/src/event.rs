//! The inbound event recorded for every accepted delivery.

use crate::headers::GitlabHeaders;

/// One webhook delivery as received: header fields plus the body text.
///
/// Built once per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// `Content-Length` as sent by the provider.
    pub content_length: Option<String>,
    /// `X-Gitlab-Event`, e.g. `Pipeline Hook`.
    pub event_type: Option<String>,
    /// `X-Gitlab-Instance`, the origin GitLab URL.
    pub instance: Option<String>,
    /// The request body, exactly as received.
    pub payload: String,
    /// `X-Gitlab-Token`.
    pub token: Option<String>,
    /// `User-Agent`.
    pub user_agent: Option<String>,
    /// `X-Gitlab-Event-UUID`. Not unique across redeliveries.
    pub event_uuid: Option<String>,
    /// Whether every required GitLab header was present.
    pub got_all_headers: bool,
}

impl InboundEvent {
    /// Assembles an event from extracted headers and the decoded body text.
    #[must_use]
    pub fn new(headers: GitlabHeaders, got_all_headers: bool, payload: String) -> Self {
        Self {
            content_length: headers.content_length,
            event_type: headers.event_type,
            instance: headers.instance,
            payload,
            token: headers.token,
            user_agent: headers.user_agent,
            event_uuid: headers.event_uuid,
            got_all_headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_moves_header_fields_into_event() {
        let headers = GitlabHeaders {
            content_length: Some("17".into()),
            event_type: Some("Pipeline Hook".into()),
            instance: Some("https://gitlab.example.com".into()),
            token: Some("secret".into()),
            user_agent: Some("GitLab/17.0.0".into()),
            event_uuid: Some("f3a1c2d4-0000-4000-8000-000000000001".into()),
        };

        let event = InboundEvent::new(headers, true, "{\"a\":1}".into());

        assert_eq!(event.content_length.as_deref(), Some("17"));
        assert_eq!(event.event_type.as_deref(), Some("Pipeline Hook"));
        assert_eq!(event.instance.as_deref(), Some("https://gitlab.example.com"));
        assert_eq!(event.token.as_deref(), Some("secret"));
        assert_eq!(event.user_agent.as_deref(), Some("GitLab/17.0.0"));
        assert_eq!(
            event.event_uuid.as_deref(),
            Some("f3a1c2d4-0000-4000-8000-000000000001")
        );
        assert_eq!(event.payload, "{\"a\":1}");
        assert!(event.got_all_headers);
    }

    #[test]
    fn test_new_with_default_headers_leaves_fields_empty() {
        let event = InboundEvent::new(GitlabHeaders::default(), false, "{}".into());

        assert!(event.content_length.is_none());
        assert!(event.event_type.is_none());
        assert!(event.instance.is_none());
        assert!(event.token.is_none());
        assert!(event.user_agent.is_none());
        assert!(event.event_uuid.is_none());
        assert!(!event.got_all_headers);
    }
}
