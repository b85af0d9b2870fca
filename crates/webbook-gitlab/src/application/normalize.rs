//! Normalization of classified events into loggable, storable records.
//!
//! A pipeline yields one summary plus one `BuildObservation` per nested
//! build. Build and job events yield one `BuildSummary`. Every other kind is
//! passed through unchanged.

use std::fmt;

use serde::Serialize;
use serde_json::{Number, Value};
use tracing::info;

use webbook_core::repository::{DerivedResource, ResourceTable};

use crate::domain::events::{BuildEvent, EventKind, PipelineEvent, Runner};

/// Renders an optional field, or `-` when absent.
struct Shown<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Shown<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => value.fmt(f),
            None => f.write_str("-"),
        }
    }
}

/// Pipeline-level fields of a pipeline event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    /// Pipeline id.
    pub pipeline_id: Option<i64>,
    /// Pipeline status.
    pub status: Option<String>,
    /// Branch or tag.
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    /// Trigger source.
    pub source: Option<String>,
    /// Run time in seconds, as sent.
    pub duration: Option<Number>,
    /// Queue time in seconds, as sent.
    pub queued_duration: Option<Number>,
    /// Creation timestamp as sent.
    pub created_at: Option<String>,
    /// Finish timestamp as sent.
    pub finished_at: Option<String>,
    /// Project id.
    pub project_id: Option<i64>,
    /// `group/project` path.
    pub project: Option<String>,
    /// Stage names in order.
    pub stages: Vec<String>,
    /// Number of builds in the payload.
    pub build_count: usize,
}

/// One build of a pipeline, carrying the pipeline's fields alongside its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildObservation {
    /// Pipeline id.
    pub pipeline_id: Option<i64>,
    /// Pipeline status.
    pub status: Option<String>,
    /// Pipeline run time in seconds.
    pub duration: Option<Number>,
    /// `group/project` path.
    pub project: Option<String>,
    /// Build id.
    pub build_id: Option<i64>,
    /// Build status.
    pub build_status: Option<String>,
    /// Build run time in seconds.
    pub build_duration: Option<Number>,
    /// Runner id.
    pub runner_id: Option<i64>,
    /// Runner description.
    pub runner_description: Option<String>,
}

impl fmt::Display for BuildObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pipeline_id={} status={} project={} duration={} build.id={} build.status={} \
             runner.id={} runner.desc={}",
            Shown(&self.pipeline_id),
            Shown(&self.status),
            Shown(&self.project),
            Shown(&self.duration),
            Shown(&self.build_id),
            Shown(&self.build_status),
            Shown(&self.runner_id),
            Shown(&self.runner_description),
        )
    }
}

/// Canonical fields of a build or job event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSummary {
    /// Build id.
    pub build_id: Option<i64>,
    /// Build status.
    pub status: Option<String>,
    /// Stage name.
    pub stage: Option<String>,
    /// Job name.
    pub name: Option<String>,
    /// Start timestamp as sent.
    pub started_at: Option<String>,
    /// Finish timestamp as sent.
    pub finished_at: Option<String>,
    /// Run time in seconds, as sent.
    pub duration: Option<Number>,
    /// Queue time in seconds, as sent.
    pub queued_duration: Option<Number>,
    /// Failure reason.
    pub failure_reason: Option<String>,
    /// Owning pipeline id.
    pub pipeline_id: Option<i64>,
    /// Runner id.
    pub runner_id: Option<i64>,
    /// Runner description.
    pub runner_description: Option<String>,
    /// Project id.
    pub project_id: Option<i64>,
    /// Project name.
    pub project_name: Option<String>,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "build.id={} status={} stage={} name={} started_at={} finished_at={} duration={} \
             pipeline_id={} runner.id={} runner.desc={}",
            Shown(&self.build_id),
            Shown(&self.status),
            Shown(&self.stage),
            Shown(&self.name),
            Shown(&self.started_at),
            Shown(&self.finished_at),
            Shown(&self.duration),
            Shown(&self.pipeline_id),
            Shown(&self.runner_id),
            Shown(&self.runner_description),
        )
    }
}

/// A classified event reduced to its canonical fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// A pipeline and one observation per build.
    Pipeline {
        /// Pipeline-level fields.
        summary: PipelineSummary,
        /// One entry per nested build, in payload order.
        observations: Vec<BuildObservation>,
    },
    /// A build event.
    Build(BuildSummary),
    /// A job event.
    Job(BuildSummary),
    /// Any other kind, unchanged.
    PassThrough(Value),
}

fn runner_fields(runner: Option<&Runner>) -> (Option<i64>, Option<String>) {
    runner.map_or((None, None), |r| (r.id, r.description.clone()))
}

fn normalize_pipeline(pipeline: &PipelineEvent) -> Normalized {
    let attributes = pipeline.object_attributes.clone().unwrap_or_default();
    let project = pipeline.project.clone().unwrap_or_default();
    let builds = pipeline.builds.as_deref().unwrap_or_default();

    let observations = builds
        .iter()
        .map(|build| {
            let (runner_id, runner_description) = runner_fields(build.runner.as_ref());
            BuildObservation {
                pipeline_id: attributes.id,
                status: attributes.status.clone(),
                duration: attributes.duration.clone(),
                project: project.path_with_namespace.clone(),
                build_id: build.id,
                build_status: build.status.clone(),
                build_duration: build.duration.clone(),
                runner_id,
                runner_description,
            }
        })
        .collect();

    let summary = PipelineSummary {
        pipeline_id: attributes.id,
        status: attributes.status,
        git_ref: attributes.git_ref,
        source: attributes.source,
        duration: attributes.duration,
        queued_duration: attributes.queued_duration,
        created_at: attributes.created_at,
        finished_at: attributes.finished_at,
        project_id: project.id,
        project: project.path_with_namespace,
        stages: attributes.stages.unwrap_or_default(),
        build_count: builds.len(),
    };

    Normalized::Pipeline {
        summary,
        observations,
    }
}

fn summarize_build(build: &BuildEvent) -> BuildSummary {
    let (runner_id, runner_description) = runner_fields(build.runner.as_ref());
    BuildSummary {
        build_id: build.build_id,
        status: build.build_status.clone(),
        stage: build.build_stage.clone(),
        name: build.build_name.clone(),
        started_at: build.build_started_at.clone(),
        finished_at: build.build_finished_at.clone(),
        duration: build.build_duration.clone(),
        queued_duration: build.build_queued_duration.clone(),
        failure_reason: build.build_failure_reason.clone(),
        pipeline_id: build.pipeline_id,
        runner_id,
        runner_description,
        project_id: build.project_id,
        project_name: build.project_name.clone(),
    }
}

/// Reduces a classified event to its canonical fields.
#[must_use]
pub fn normalize(kind: &EventKind) -> Normalized {
    match kind {
        EventKind::Pipeline(pipeline) => normalize_pipeline(pipeline),
        EventKind::Build(build) => Normalized::Build(summarize_build(build)),
        EventKind::Job(job) => Normalized::Job(summarize_build(job)),
        EventKind::Push(value)
        | EventKind::Tag(value)
        | EventKind::Issue(value)
        | EventKind::ConfidentialIssue(value)
        | EventKind::Comment(value)
        | EventKind::MergeRequest(value)
        | EventKind::WikiPage(value)
        | EventKind::SystemHook(value) => Normalized::PassThrough(value.clone()),
    }
}

fn to_descriptor<T: Serialize>(value: &T) -> Value {
    // Serialization of derived Serialize types to Value is infallible.
    serde_json::to_value(value).expect("normalized record serialization is infallible")
}

impl Normalized {
    /// Rows to write into the derived relations.
    #[must_use]
    pub fn derived_resources(&self) -> Vec<DerivedResource> {
        match self {
            Self::Pipeline {
                summary,
                observations,
            } => vec![DerivedResource {
                table: ResourceTable::Pipeline,
                descriptor: serde_json::json!({
                    "pipeline": to_descriptor(summary),
                    "builds": to_descriptor(observations),
                }),
            }],
            Self::Build(summary) | Self::Job(summary) => vec![DerivedResource {
                table: ResourceTable::Job,
                descriptor: to_descriptor(summary),
            }],
            Self::PassThrough(_) => vec![],
        }
    }

    /// Emits one structured log event per observation.
    pub fn emit(&self, kind: &'static str) {
        match self {
            Self::Pipeline {
                summary,
                observations,
            } => {
                info!(
                    kind,
                    pipeline_id = %Shown(&summary.pipeline_id),
                    status = %Shown(&summary.status),
                    project = %Shown(&summary.project),
                    duration = %Shown(&summary.duration),
                    builds = summary.build_count,
                    "pipeline received"
                );
                for observation in observations {
                    info!(
                        kind,
                        pipeline_id = %Shown(&observation.pipeline_id),
                        status = %Shown(&observation.status),
                        project = %Shown(&observation.project),
                        duration = %Shown(&observation.duration),
                        build.id = %Shown(&observation.build_id),
                        build.status = %Shown(&observation.build_status),
                        runner.id = %Shown(&observation.runner_id),
                        runner.desc = %Shown(&observation.runner_description),
                        "{observation}"
                    );
                }
            }
            Self::Build(summary) | Self::Job(summary) => {
                info!(
                    kind,
                    build.id = %Shown(&summary.build_id),
                    build.status = %Shown(&summary.status),
                    build.stage = %Shown(&summary.stage),
                    build.name = %Shown(&summary.name),
                    started_at = %Shown(&summary.started_at),
                    finished_at = %Shown(&summary.finished_at),
                    duration = %Shown(&summary.duration),
                    pipeline_id = %Shown(&summary.pipeline_id),
                    "{summary}"
                );
            }
            Self::PassThrough(value) => {
                info!(kind, payload = %value, "event received");
            }
        }
    }
}
