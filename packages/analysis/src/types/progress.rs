//! Pipeline stages and the events streamed to subscribers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::competitor::AnalysisResult;

/// The orchestrator's state machine, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Discovery,
    Verification,
    Extraction,
    Intelligence,
    Synthesis,
    Complete,
}

impl Stage {
    /// Human label for progress messages.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Discovery => "Discovery",
            Stage::Verification => "Verification",
            Stage::Extraction => "Extraction",
            Stage::Intelligence => "Intelligence",
            Stage::Synthesis => "Synthesis",
            Stage::Complete => "Complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressEventKind {
    Connected,
    Progress,
    Complete,
}

/// A transient progress update. Never stored, only streamed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: ProgressEventKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    pub message: String,

    pub progress: u8,

    pub completed_stages: Vec<Stage>,

    /// Full result payload, carried only on the terminal event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
}

impl ProgressEvent {
    /// First event delivered to a fresh subscriber.
    pub fn connected() -> Self {
        Self {
            kind: ProgressEventKind::Connected,
            stage: None,
            message: "Connected to analysis stream".to_string(),
            progress: 0,
            completed_stages: Vec::new(),
            result: None,
        }
    }

    pub fn progress(
        stage: Stage,
        message: impl Into<String>,
        progress: u8,
        completed_stages: Vec<Stage>,
    ) -> Self {
        Self {
            kind: ProgressEventKind::Progress,
            stage: Some(stage),
            message: message.into(),
            progress,
            completed_stages,
            result: None,
        }
    }

    /// Terminal event carrying the full result payload.
    pub fn complete(result: AnalysisResult, completed_stages: Vec<Stage>) -> Self {
        Self {
            kind: ProgressEventKind::Complete,
            stage: Some(Stage::Complete),
            message: "Analysis complete".to_string(),
            progress: 100,
            completed_stages,
            result: Some(result),
        }
    }
}
