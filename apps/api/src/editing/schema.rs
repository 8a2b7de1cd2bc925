//! Staged schema validation for backend payloads.
//!
//! Stage 1 parses the isolated object into the wire shape with its required
//! keys (no defaults). Stage 2 re-validates the nested resume against the
//! document schema. All internal logic downstream operates on the typed
//! records, never on an untyped map.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::editing::payload::{isolate, PayloadError};
use crate::models::resume::Resume;

/// A candidate edit produced by the pipeline: explanatory text, a list of
/// short change descriptions, a full proposed snapshot, and whether the user
/// must confirm before anything is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditProposal {
    pub assistant_message: String,
    pub edits_summary: Vec<String>,
    pub proposed_resume: Resume,
    pub needs_confirmation: bool,
}

/// Wire shape of a proposal: all four keys are required, and the resume is
/// held as a raw value so nested validation is a distinct, reportable step.
#[derive(Debug, Deserialize)]
struct ProposalWire {
    assistant_message: String,
    edits_summary: Vec<String>,
    proposed_resume: Value,
    needs_confirmation: bool,
}

/// Validates raw backend text against the proposal schema.
///
/// Steps: isolate the JSON object, parse the proposal wire shape, then
/// validate the nested `proposed_resume` against the document schema.
/// Also enforces the structural invariant that a proposal requiring
/// confirmation must describe at least one edit.
pub fn validate_proposal(raw: &str) -> Result<EditProposal, PayloadError> {
    let payload = isolate(raw)?;

    let wire: ProposalWire = serde_json::from_str(payload)
        .map_err(|e| PayloadError::Validation(format!("proposal schema: {e}")))?;

    let proposed_resume: Resume = serde_json::from_value(wire.proposed_resume)
        .map_err(|e| PayloadError::Validation(format!("proposed_resume schema: {e}")))?;

    if wire.needs_confirmation && wire.edits_summary.iter().all(|s| s.trim().is_empty()) {
        return Err(PayloadError::Validation(
            "needs_confirmation is true but edits_summary is empty".to_string(),
        ));
    }

    Ok(EditProposal {
        assistant_message: wire.assistant_message,
        edits_summary: wire.edits_summary,
        proposed_resume,
        needs_confirmation: wire.needs_confirmation,
    })
}

/// Validates raw backend text against the document schema alone
/// (used by the structuring and tailoring calls).
pub fn validate_resume(raw: &str) -> Result<Resume, PayloadError> {
    let payload = isolate(raw)?;
    serde_json::from_str(payload)
        .map_err(|e| PayloadError::Validation(format!("resume schema: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal_json(needs_confirmation: bool, summary: &str) -> String {
        let summary_json = if summary.is_empty() {
            "[]".to_string()
        } else {
            format!("[\"{summary}\"]")
        };
        format!(
            r#"{{
                "assistant_message": "Here is the change.",
                "edits_summary": {summary_json},
                "proposed_resume": {{"header": {{"name": "Ada"}}}},
                "needs_confirmation": {needs_confirmation}
            }}"#
        )
    }

    #[test]
    fn test_valid_proposal_parses() {
        let proposal = validate_proposal(&proposal_json(true, "Tightened summary bullet")).unwrap();
        assert_eq!(proposal.assistant_message, "Here is the change.");
        assert_eq!(proposal.proposed_resume.header.name, "Ada");
        assert!(proposal.needs_confirmation);
    }

    #[test]
    fn test_fenced_proposal_round_trips() {
        let fenced = format!("```json\n{}\n```", proposal_json(false, ""));
        let proposal = validate_proposal(&fenced).unwrap();
        assert!(!proposal.needs_confirmation);
        assert!(proposal.edits_summary.is_empty());
    }

    #[test]
    fn test_missing_required_key_fails_validation() {
        let raw = r#"{"assistant_message": "hi", "edits_summary": [], "needs_confirmation": false}"#;
        let err = validate_proposal(raw).unwrap_err();
        assert!(matches!(err, PayloadError::Validation(_)));
    }

    #[test]
    fn test_wrong_type_fails_validation() {
        let raw = r#"{
            "assistant_message": "hi",
            "edits_summary": "not a list",
            "proposed_resume": {},
            "needs_confirmation": false
        }"#;
        let err = validate_proposal(raw).unwrap_err();
        assert!(matches!(err, PayloadError::Validation(_)));
    }

    #[test]
    fn test_nested_resume_type_mismatch_fails() {
        let raw = r#"{
            "assistant_message": "hi",
            "edits_summary": ["change"],
            "proposed_resume": {"education": "not a list"},
            "needs_confirmation": true
        }"#;
        let err = validate_proposal(raw).unwrap_err();
        match err {
            PayloadError::Validation(msg) => assert!(msg.contains("proposed_resume")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_confirmation_without_summary_fails() {
        let err = validate_proposal(&proposal_json(true, "")).unwrap_err();
        assert!(matches!(err, PayloadError::Validation(_)));
    }

    #[test]
    fn test_unbalanced_object_is_extraction_failure() {
        let err = validate_proposal(r#"{"assistant_message": "hi""#).unwrap_err();
        assert!(matches!(err, PayloadError::Extraction(_)));
    }

    #[test]
    fn test_validate_resume_accepts_partial_document() {
        let resume = validate_resume(r#"{"awards": ["Dean's List"]}"#).unwrap();
        assert_eq!(resume.awards, vec!["Dean's List".to_string()]);
        assert!(resume.header.name.is_empty());
    }

    #[test]
    fn test_validate_resume_rejects_non_object_fields() {
        let err = validate_resume(r#"{"skills": []}"#).unwrap_err();
        assert!(matches!(err, PayloadError::Validation(_)));
    }
}
