use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Working stages of one ingestion, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    Resolving,
    FetchingMetadata,
    CheckingDuplicate,
    Downloading,
    Uploading,
    Transcribing,
    BuildingShots,
    Analyzing,
    Merging,
    Persisting,
}

impl IngestStage {
    pub const ALL: [IngestStage; 10] = [
        IngestStage::Resolving,
        IngestStage::FetchingMetadata,
        IngestStage::CheckingDuplicate,
        IngestStage::Downloading,
        IngestStage::Uploading,
        IngestStage::Transcribing,
        IngestStage::BuildingShots,
        IngestStage::Analyzing,
        IngestStage::Merging,
        IngestStage::Persisting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestStage::Resolving => "resolving",
            IngestStage::FetchingMetadata => "fetching_metadata",
            IngestStage::CheckingDuplicate => "checking_duplicate",
            IngestStage::Downloading => "downloading",
            IngestStage::Uploading => "uploading",
            IngestStage::Transcribing => "transcribing",
            IngestStage::BuildingShots => "building_shots",
            IngestStage::Analyzing => "analyzing",
            IngestStage::Merging => "merging",
            IngestStage::Persisting => "persisting",
        }
    }

    /// The stage that follows this one, `None` after `Persisting`.
    pub fn next(&self) -> Option<IngestStage> {
        let idx = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(idx + 1).copied()
    }
}

impl Display for IngestStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IngestStage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IngestStage::ALL
            .iter()
            .find(|stage| stage.as_str() == s)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Invalid ingest stage: {}", s))
    }
}

/// State of one ingestion run.
///
/// `Done` and `Failed` are absorbing: once reached, no further transition is
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Running { stage: IngestStage },
    Done,
    Failed { stage: IngestStage, reason: String },
}

impl PipelineState {
    pub fn start() -> Self {
        PipelineState::Running {
            stage: IngestStage::Resolving,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed { .. })
    }

    pub fn stage(&self) -> Option<IngestStage> {
        match self {
            PipelineState::Running { stage } | PipelineState::Failed { stage, .. } => Some(*stage),
            PipelineState::Done => None,
        }
    }

    /// Move to the next working stage, or to `Done` after `Persisting`.
    pub fn advance(&self) -> Result<PipelineState, anyhow::Error> {
        match self {
            PipelineState::Running { stage } => Ok(match stage.next() {
                Some(next) => PipelineState::Running { stage: next },
                None => PipelineState::Done,
            }),
            terminal => Err(anyhow::anyhow!(
                "Cannot advance from terminal state {:?}",
                terminal
            )),
        }
    }

    pub fn fail(&self, reason: impl Into<String>) -> Result<PipelineState, anyhow::Error> {
        match self {
            PipelineState::Running { stage } => Ok(PipelineState::Failed {
                stage: *stage,
                reason: reason.into(),
            }),
            terminal => Err(anyhow::anyhow!(
                "Cannot fail from terminal state {:?}",
                terminal
            )),
        }
    }
}
