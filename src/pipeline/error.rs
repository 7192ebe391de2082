//! Pipeline error taxonomy

use super::stage::PipelineStage;
use thiserror::Error;

/// Why a pipeline run stopped before presenting results
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The query was blank; no stage ran
    #[error("Please enter a search query.")]
    EmptyQuery,

    /// The search stage returned no records
    #[error("No search results found.")]
    EmptySearchResult,

    /// None of the records carried a usable URL
    #[error("No valid URLs found in search results.")]
    NoExtractableUrls,

    /// A collaborator call failed
    #[error("Error: {error}")]
    Collaborator {
        stage: PipelineStage,
        error: anyhow::Error,
    },

    /// The run was cancelled between or during stages
    #[error("The search was cancelled.")]
    Cancelled,
}

impl PipelineError {
    pub fn collaborator(stage: PipelineStage, error: anyhow::Error) -> Self {
        Self::Collaborator { stage, error }
    }

    /// Stage the run stopped in; unknown for cancellation
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::EmptyQuery => Some(PipelineStage::Idle),
            Self::EmptySearchResult => Some(PipelineStage::Searching),
            Self::NoExtractableUrls => Some(PipelineStage::ExtractingUrls),
            Self::Collaborator { stage, .. } => Some(*stage),
            Self::Cancelled => None,
        }
    }

    /// Full diagnostic text (cause chain) for collaborator failures
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Collaborator { error, .. } => Some(format!("{:#}", error)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_messages() {
        assert_eq!(
            PipelineError::EmptySearchResult.to_string(),
            "No search results found."
        );
        assert_eq!(
            PipelineError::NoExtractableUrls.to_string(),
            "No valid URLs found in search results."
        );
        assert!(PipelineError::EmptySearchResult.detail().is_none());
        assert_eq!(PipelineError::EmptyQuery.stage(), Some(PipelineStage::Idle));
        assert_eq!(
            PipelineError::NoExtractableUrls.stage(),
            Some(PipelineStage::ExtractingUrls)
        );
        assert_eq!(PipelineError::Cancelled.stage(), None);
    }

    #[test]
    fn test_collaborator_detail_includes_cause_chain() {
        let error = Err::<(), _>(anyhow::anyhow!("connection reset"))
            .context("request to https://example.com failed")
            .unwrap_err();
        let err = PipelineError::collaborator(PipelineStage::BuildingIndex, error);

        assert_eq!(err.to_string(), "Error: request to https://example.com failed");
        assert_eq!(err.stage(), Some(PipelineStage::BuildingIndex));

        assert_eq!(
            err.detail().as_deref(),
            Some("request to https://example.com failed: connection reset")
        );
    }
}
