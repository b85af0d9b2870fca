//! GitLab header validation and extraction.

use crate::error::IngestError;

/// `X-Gitlab-Instance`
pub const HEADER_INSTANCE: &str = "x-gitlab-instance";
/// `X-Gitlab-Event`
pub const HEADER_EVENT: &str = "x-gitlab-event";
/// `X-Gitlab-Token`
pub const HEADER_TOKEN: &str = "x-gitlab-token";
/// `X-Gitlab-Event-UUID`
pub const HEADER_EVENT_UUID: &str = "x-gitlab-event-uuid";
/// `Content-Length`
pub const HEADER_CONTENT_LENGTH: &str = "content-length";
/// `User-Agent`
pub const HEADER_USER_AGENT: &str = "user-agent";

/// Headers that identify a request as a GitLab webhook delivery.
pub const REQUIRED_GITLAB_HEADERS: [&str; 4] = [
    HEADER_INSTANCE,
    HEADER_EVENT,
    HEADER_TOKEN,
    HEADER_EVENT_UUID,
];

/// Returns `true` if **any** name in `required` appears in `present`.
///
/// This is a match-any check: a single GitLab header is enough to treat the
/// request as a GitLab delivery. Names compare case-insensitively.
pub fn has_required_headers<'a>(
    required: &[&str],
    present: impl IntoIterator<Item = &'a str>,
) -> bool {
    present
        .into_iter()
        .any(|name| required.iter().any(|r| r.eq_ignore_ascii_case(name)))
}

/// Returns `true` only if **every** name in `required` appears in `present`.
pub fn has_all_headers<'a>(
    required: &[&str],
    present: impl IntoIterator<Item = &'a str> + Clone,
) -> bool {
    required.iter().all(|r| {
        present
            .clone()
            .into_iter()
            .any(|name| r.eq_ignore_ascii_case(name))
    })
}

/// The named headers captured from a GitLab delivery. Absent headers are
/// `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitlabHeaders {
    /// `Content-Length`
    pub content_length: Option<String>,
    /// `X-Gitlab-Event`
    pub event_type: Option<String>,
    /// `X-Gitlab-Instance`
    pub instance: Option<String>,
    /// `X-Gitlab-Token`
    pub token: Option<String>,
    /// `User-Agent`
    pub user_agent: Option<String>,
    /// `X-Gitlab-Event-UUID`
    pub event_uuid: Option<String>,
}

impl GitlabHeaders {
    /// Extracts the named headers through `lookup`, which returns the raw
    /// value bytes for a lowercase header name.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::InvalidHeader` if a present value is not UTF-8.
    pub fn extract<'a, F>(lookup: F) -> Result<Self, IngestError>
    where
        F: Fn(&str) -> Option<&'a [u8]>,
    {
        let text = |name: &str| -> Result<Option<String>, IngestError> {
            lookup(name)
                .map(|bytes| {
                    String::from_utf8(bytes.to_vec()).map_err(|_| IngestError::InvalidHeader {
                        name: name.to_owned(),
                    })
                })
                .transpose()
        };

        Ok(Self {
            content_length: text(HEADER_CONTENT_LENGTH)?,
            event_type: text(HEADER_EVENT)?,
            instance: text(HEADER_INSTANCE)?,
            token: text(HEADER_TOKEN)?,
            user_agent: text(HEADER_USER_AGENT)?,
            event_uuid: text(HEADER_EVENT_UUID)?,
        })
    }
}
