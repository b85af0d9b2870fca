//! GitLab event kinds and the typed payloads the recorder reads.
//!
//! Only pipeline and build/job payloads are decoded into structs; every
//! field is optional so that structural classification never turns into
//! schema validation. Durations stay `serde_json::Number` to keep the
//! integer or float representation GitLab sent.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Runner that executed a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Runner {
    /// Runner id.
    pub id: Option<i64>,
    /// Free-form runner description.
    pub description: Option<String>,
    /// `instance_type`, `group_type` or `project_type`.
    pub runner_type: Option<String>,
    /// Whether the runner is active.
    pub active: Option<bool>,
    /// Whether the runner is shared.
    pub is_shared: Option<bool>,
    /// Runner tags.
    pub tags: Option<Vec<String>>,
}

/// Project block of a pipeline payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Project id.
    pub id: Option<i64>,
    /// Project name.
    pub name: Option<String>,
    /// Project URL.
    pub web_url: Option<String>,
    /// `group/project` path.
    pub path_with_namespace: Option<String>,
    /// Default branch.
    pub default_branch: Option<String>,
}

/// `object_attributes` of a pipeline payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineAttributes {
    /// Pipeline id.
    pub id: Option<i64>,
    /// Project-scoped pipeline id.
    pub iid: Option<i64>,
    /// Branch or tag name.
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    /// Whether `ref` is a tag.
    pub tag: Option<bool>,
    /// Commit sha.
    pub sha: Option<String>,
    /// Trigger source, e.g. `push`.
    pub source: Option<String>,
    /// Pipeline status.
    pub status: Option<String>,
    /// Detailed status.
    pub detailed_status: Option<String>,
    /// Stage names in order.
    pub stages: Option<Vec<String>>,
    /// Creation timestamp as sent.
    pub created_at: Option<String>,
    /// Finish timestamp as sent.
    pub finished_at: Option<String>,
    /// Run time in seconds.
    pub duration: Option<Number>,
    /// Queue time in seconds.
    pub queued_duration: Option<Number>,
}

/// A build nested in a pipeline payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineBuild {
    /// Build id.
    pub id: Option<i64>,
    /// Stage name.
    pub stage: Option<String>,
    /// Job name.
    pub name: Option<String>,
    /// Build status.
    pub status: Option<String>,
    /// Creation timestamp as sent.
    pub created_at: Option<String>,
    /// Start timestamp as sent.
    pub started_at: Option<String>,
    /// Finish timestamp as sent.
    pub finished_at: Option<String>,
    /// Run time in seconds.
    pub duration: Option<Number>,
    /// Queue time in seconds.
    pub queued_duration: Option<Number>,
    /// Failure reason, when failed.
    pub failure_reason: Option<String>,
    /// Whether failure is allowed.
    pub allow_failure: Option<bool>,
    /// Runner that picked up the build.
    pub runner: Option<Runner>,
}

/// A `pipeline` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Pipeline attributes.
    pub object_attributes: Option<PipelineAttributes>,
    /// Owning project.
    pub project: Option<ProjectRef>,
    /// Builds of the pipeline.
    pub builds: Option<Vec<PipelineBuild>>,
}

/// A `build` (job) payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildEvent {
    /// Branch or tag name.
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    /// Commit sha.
    pub sha: Option<String>,
    /// Build id.
    pub build_id: Option<i64>,
    /// Job name.
    pub build_name: Option<String>,
    /// Stage name.
    pub build_stage: Option<String>,
    /// Build status.
    pub build_status: Option<String>,
    /// Creation timestamp as sent.
    pub build_created_at: Option<String>,
    /// Start timestamp as sent.
    pub build_started_at: Option<String>,
    /// Finish timestamp as sent.
    pub build_finished_at: Option<String>,
    /// Run time in seconds.
    pub build_duration: Option<Number>,
    /// Queue time in seconds.
    pub build_queued_duration: Option<Number>,
    /// Whether failure is allowed.
    pub build_allow_failure: Option<bool>,
    /// Failure reason, when failed.
    pub build_failure_reason: Option<String>,
    /// Owning pipeline id.
    pub pipeline_id: Option<i64>,
    /// Runner that picked up the build.
    pub runner: Option<Runner>,
    /// Owning project id.
    pub project_id: Option<i64>,
    /// Owning project name.
    pub project_name: Option<String>,
}

/// The closed set of GitLab event kinds the recorder distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Branch push.
    Push(Value),
    /// Tag push.
    Tag(Value),
    /// Issue event.
    Issue(Value),
    /// Issue event on a confidential issue.
    ConfidentialIssue(Value),
    /// Comment (note) event.
    Comment(Value),
    /// Merge request event.
    MergeRequest(Value),
    /// Wiki page event.
    WikiPage(Value),
    /// Pipeline event.
    Pipeline(Box<PipelineEvent>),
    /// Build event.
    Build(Box<BuildEvent>),
    /// Job event.
    Job(Box<BuildEvent>),
    /// System hook.
    SystemHook(Value),
}

impl EventKind {
    /// Stable name used in logs, metrics and responses.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Push(_) => "push",
            Self::Tag(_) => "tag_push",
            Self::Issue(_) => "issue",
            Self::ConfidentialIssue(_) => "confidential_issue",
            Self::Comment(_) => "note",
            Self::MergeRequest(_) => "merge_request",
            Self::WikiPage(_) => "wiki_page",
            Self::Pipeline(_) => "pipeline",
            Self::Build(_) => "build",
            Self::Job(_) => "job",
            Self::SystemHook(_) => "system_hook",
        }
    }
}
