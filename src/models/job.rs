use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Status of a campaign generation job.
///
/// Transitions are monotonic: `pending -> processing -> {completed | failed}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Output image shape class accepted by the generation model.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display,
)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    #[strum(serialize = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    #[strum(serialize = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    #[strum(serialize = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [Self::Square, Self::Portrait, Self::Landscape];

    /// Size parameter the generation API expects for this ratio.
    pub fn size_param(&self) -> &'static str {
        match self {
            Self::Square => "2048*2048",
            Self::Portrait => "1152*2048",
            Self::Landscape => "2048*1152",
        }
    }

    /// Filesystem-safe directory name ("9:16" -> "9_16").
    pub fn dir_name(&self) -> String {
        self.to_string().replace(':', "_")
    }
}

/// Structured failure classification carried alongside the human-readable
/// error message. Clients switch recovery flows on this, never on message
/// substrings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// A free-text campaign field matched the prohibited-term list.
    ProhibitedContent,
    /// The upstream model flagged the prompt or output as sensitive.
    SensitiveContent,
    RateLimited,
    AuthRejected,
    Timeout,
    Upstream,
    /// Local pipeline failure (disk, decode), not attributable upstream.
    Internal,
}

impl FailureKind {
    /// Failures the client can recover from by revising the campaign brief.
    pub fn needs_brief_revision(&self) -> bool {
        matches!(self, Self::ProhibitedContent | Self::SensitiveContent)
    }
}

/// Terminal error recorded on a failed job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobError {
    pub kind: FailureKind,
    pub message: String,
}

impl JobError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Coarse progress of a running job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Progress {
    pub step: String,
    /// Percent estimate, 0-100, monotonically non-decreasing per job.
    pub progress: u8,
}

impl Progress {
    pub fn new(step: impl Into<String>, progress: u8) -> Self {
        Self {
            step: step.into(),
            progress,
        }
    }
}

/// A single generated banner artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageArtifact {
    pub aspect_ratio: AspectRatio,
    /// Path relative to the outputs mount.
    pub path: String,
    /// URL joined with the `/outputs/` prefix.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[u32; 2]>,
}

/// Assembled result of a completed generation job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationResult {
    pub brand_name: String,
    pub campaign_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_campaign_message: Option<String>,
    pub images: Vec<ImageArtifact>,
    pub output_dir: String,
}

/// A campaign generation job tracked in the job store.
///
/// After creation only the generation worker mutates a job; readers always
/// observe whole snapshots. `result` is populated iff `completed`, `error`
/// iff `failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress: Option<Progress>,
    pub result: Option<GenerationResult>,
    pub error: Option<JobError>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn pending(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Pending,
            progress: None,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn start_processing(&mut self) {
        self.status = JobStatus::Processing;
        self.touch();
    }

    pub fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
        self.touch();
    }

    pub fn complete(&mut self, result: GenerationResult) {
        self.status = JobStatus::Completed;
        self.progress = Some(Progress::new("Complete", 100));
        self.result = Some(result);
        self.touch();
    }

    pub fn fail(&mut self, error: JobError) {
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Response after submitting a campaign for generation.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
}

/// Wire view of a job for the status endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusView {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
}

impl From<&Job> for JobStatusView {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            progress: job.progress.clone(),
            error: job.error.as_ref().map(|e| e.message.clone()),
            error_kind: job.error.as_ref().map(|e| e.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_wire_format() {
        let json = serde_json::to_string(&AspectRatio::Portrait).unwrap();
        assert_eq!(json, "\"9:16\"");
        let parsed: AspectRatio = serde_json::from_str("\"16:9\"").unwrap();
        assert_eq!(parsed, AspectRatio::Landscape);
        assert_eq!(AspectRatio::Square.size_param(), "2048*2048");
        assert_eq!(AspectRatio::Portrait.dir_name(), "9_16");
    }

    #[test]
    fn job_transitions_preserve_invariants() {
        let mut job = Job::pending(Uuid::new_v4());
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.result.is_none() && job.error.is_none());

        job.start_processing();
        job.set_progress(Progress::new("Optimizing prompt", 40));
        assert_eq!(job.status, JobStatus::Processing);

        job.complete(GenerationResult {
            brand_name: "TrailCraft".into(),
            campaign_message: "Run Further".into(),
            translated_campaign_message: None,
            images: vec![],
            output_dir: "trailcraft_20250101_000000".into(),
        });
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.status.is_terminal());
        assert!(job.result.is_some());
        assert!(job.error.is_none());
        assert_eq!(job.progress.as_ref().unwrap().progress, 100);
    }

    #[test]
    fn failed_job_exposes_structured_kind_in_status_view() {
        let mut job = Job::pending(Uuid::new_v4());
        job.start_processing();
        job.fail(JobError::new(
            FailureKind::SensitiveContent,
            "Content flagged as sensitive. Please revise the campaign brief.",
        ));

        let view = JobStatusView::from(&job);
        assert_eq!(view.status, JobStatus::Failed);
        assert_eq!(view.error_kind, Some(FailureKind::SensitiveContent));
        assert!(view.error.as_ref().unwrap().contains("flagged"));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["error_kind"], "sensitive_content");
    }
}
