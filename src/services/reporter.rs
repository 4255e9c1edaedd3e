//! Pipeline execution reporting for the one-shot CLI.
//!
//! Records per-step timing and outcome, then persists a JSON report next to
//! the generated artifacts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::campaign::CampaignRequest;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Running,
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_name: String,
    pub status: StepStatus,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub campaign_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub status: String,
    pub steps: Vec<StepRecord>,
    pub campaign_details: CampaignRequest,
    pub output_files: Vec<String>,
}

/// Tracks pipeline execution and writes the final report.
pub struct PipelineReporter {
    report: PipelineReport,
    current: Option<StepRecord>,
    output_dir: PathBuf,
}

impl PipelineReporter {
    pub fn new(campaign: &CampaignRequest, output_dir: &Path) -> Self {
        let now = Utc::now();
        let market_slug = campaign.target_market.to_lowercase().replace(' ', "_");
        let campaign_id = format!("{market_slug}_{}", now.format("%Y%m%d_%H%M%S"));
        tracing::info!(%campaign_id, "initialized pipeline reporter");

        Self {
            report: PipelineReport {
                campaign_id,
                start_time: now,
                end_time: None,
                duration_seconds: None,
                status: "running".to_string(),
                steps: Vec::new(),
                campaign_details: campaign.clone(),
                output_files: Vec::new(),
            },
            current: None,
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn start_step(&mut self, step_name: &str) {
        if self.current.is_some() {
            tracing::warn!(step = step_name, "starting step while another is active");
            self.end_step(StepStatus::Failed, Some("Step interrupted by new step"));
        }
        tracing::info!(step = step_name, "pipeline step started");
        self.current = Some(StepRecord {
            step_name: step_name.to_string(),
            status: StepStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: None,
            details: BTreeMap::new(),
            error_message: None,
        });
    }

    pub fn step_detail(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        if let Some(step) = self.current.as_mut() {
            step.details.insert(key.to_string(), value.into());
        }
    }

    pub fn end_step(&mut self, status: StepStatus, error_message: Option<&str>) {
        let Some(mut step) = self.current.take() else {
            tracing::warn!("no active step to end");
            return;
        };
        let end = Utc::now();
        let duration = (end - step.start_time).num_milliseconds() as f64 / 1000.0;
        step.end_time = Some(end);
        step.duration_seconds = Some(duration);
        step.status = status;
        step.error_message = error_message.map(str::to_string);

        match status {
            StepStatus::Failed => {
                tracing::error!(step = %step.step_name, duration, error = ?step.error_message, "pipeline step failed")
            }
            _ => tracing::info!(step = %step.step_name, duration, "pipeline step finished"),
        }
        self.report.steps.push(step);
    }

    pub fn add_output_file(&mut self, path: &str) {
        self.report.output_files.push(path.to_string());
    }

    /// Close the report, log a summary, and persist it as JSON. Returns the
    /// report path when saving succeeds.
    pub fn finalize(&mut self, status: &str) -> Option<PathBuf> {
        if self.current.is_some() {
            self.end_step(StepStatus::Failed, Some("Pipeline ended with active step"));
        }
        let end = Utc::now();
        self.report.end_time = Some(end);
        self.report.duration_seconds =
            Some((end - self.report.start_time).num_milliseconds() as f64 / 1000.0);
        self.report.status = status.to_string();

        let successful = self
            .report
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Success)
            .count();
        tracing::info!(
            campaign_id = %self.report.campaign_id,
            status,
            steps_total = self.report.steps.len(),
            steps_successful = successful,
            output_files = self.report.output_files.len(),
            duration_seconds = self.report.duration_seconds,
            "pipeline finished"
        );

        let path = self
            .output_dir
            .join(format!("report_{}.json", self.report.campaign_id));
        match serde_json::to_vec_pretty(&self.report)
            .map_err(std::io::Error::other)
            .and_then(|bytes| std::fs::write(&path, bytes))
        {
            Ok(()) => {
                tracing::info!(report = %path.display(), "report saved");
                Some(path)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save report");
                None
            }
        }
    }

    pub fn report(&self) -> &PipelineReport {
        &self.report
    }
}
