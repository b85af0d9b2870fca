//! Process counters exposed on `/metrics`.
//!
//! One `Metrics` value is created at startup and shared, through an `Arc`,
//! by the request handlers and the background reporter.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use webbook_core::error::IngestError;
use webbook_gitlab::application::ingest::IngestOutcome;
use webbook_gitlab::application::normalize::{Normalized, PipelineSummary};

use crate::error::classify_error;

const UNKNOWN_LABEL: &str = "unknown";

/// Counter registry for the listener.
pub struct Metrics {
    registry: Registry,
    deliveries: IntCounterVec,
    events: IntCounterVec,
    pipelines_created: IntCounter,
    stages_created: IntCounter,
    jobs_created: IntCounter,
    pipelines_per_project: IntCounterVec,
    reporter_ticks: IntCounter,
}

/// Point-in-time counter values for the reporter log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Deliveries with outcome `stored`.
    pub stored: u64,
    /// `pipelines_created_total`
    pub pipelines_created: u64,
    /// `stages_created_total`
    pub stages_created: u64,
    /// `jobs_created_total`
    pub jobs_created: u64,
    /// `webbook_reporter_ticks_total`
    pub reporter_ticks: u64,
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

impl Metrics {
    /// Creates and registers every counter.
    ///
    /// # Errors
    ///
    /// Returns a `prometheus::Error` if a counter is invalid or registered
    /// twice.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let deliveries = IntCounterVec::new(
            Opts::new("webbook_deliveries_total", "Webhook deliveries by outcome"),
            &["outcome"],
        )?;
        let events = IntCounterVec::new(
            Opts::new("webbook_events_total", "Stored GitLab events by kind"),
            &["kind"],
        )?;
        let pipelines_created =
            IntCounter::with_opts(Opts::new("pipelines_created_total", "All pipelines created"))?;
        let stages_created = IntCounter::with_opts(Opts::new(
            "stages_created_total",
            "All stages created across all pipelines",
        ))?;
        let jobs_created = IntCounter::with_opts(Opts::new(
            "jobs_created_total",
            "All jobs created across all pipelines",
        ))?;
        let pipelines_per_project = IntCounterVec::new(
            Opts::new("pipelines_created_for_project", "Per project pipelines count"),
            &["project", "branch"],
        )?;
        let reporter_ticks = IntCounter::with_opts(Opts::new(
            "webbook_reporter_ticks_total",
            "Background reporter ticks",
        ))?;

        registry.register(Box::new(deliveries.clone()))?;
        registry.register(Box::new(events.clone()))?;
        registry.register(Box::new(pipelines_created.clone()))?;
        registry.register(Box::new(stages_created.clone()))?;
        registry.register(Box::new(jobs_created.clone()))?;
        registry.register(Box::new(pipelines_per_project.clone()))?;
        registry.register(Box::new(reporter_ticks.clone()))?;

        Ok(Self {
            registry,
            deliveries,
            events,
            pipelines_created,
            stages_created,
            jobs_created,
            pipelines_per_project,
            reporter_ticks,
        })
    }

    /// Counts a handled delivery.
    pub fn record_outcome(&self, outcome: &IngestOutcome) {
        self.deliveries.with_label_values(&[outcome.label()]).inc();

        if let IngestOutcome::Stored {
            kind, normalized, ..
        } = outcome
        {
            self.events.with_label_values(&[*kind]).inc();
            if let Normalized::Pipeline { summary, .. } = normalized {
                self.record_pipeline(summary);
            }
        }
    }

    /// Counts a rejected delivery under its error code.
    pub fn record_rejection(&self, err: &IngestError) {
        let (_, code) = classify_error(err);
        self.deliveries.with_label_values(&[code]).inc();
    }

    /// A pipeline counts as created the first time GitLab reports it, with
    /// status `created`.
    fn record_pipeline(&self, summary: &PipelineSummary) {
        if summary.status.as_deref() != Some("created") {
            return;
        }
        self.pipelines_created.inc();
        self.stages_created.inc_by(to_u64(summary.stages.len()));
        self.jobs_created.inc_by(to_u64(summary.build_count));
        self.pipelines_per_project
            .with_label_values(&[
                summary.project.as_deref().unwrap_or(UNKNOWN_LABEL),
                summary.git_ref.as_deref().unwrap_or(UNKNOWN_LABEL),
            ])
            .inc();
    }

    /// Counts one reporter tick.
    pub fn record_tick(&self) {
        self.reporter_ticks.inc();
    }

    /// Current counter values.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            stored: self.deliveries.with_label_values(&["stored"]).get(),
            pipelines_created: self.pipelines_created.get(),
            stages_created: self.stages_created.get(),
            jobs_created: self.jobs_created.get(),
            reporter_ticks: self.reporter_ticks.get(),
        }
    }

    /// Renders every counter in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns a `prometheus::Error` if encoding fails.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
