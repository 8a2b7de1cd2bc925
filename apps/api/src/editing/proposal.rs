//! Edit proposal pipeline — turns a user message plus the current document
//! into a validated `EditProposal`.
//!
//! Flow: build prompt → backend call → isolate JSON → validate schema →
//!       (on failure) one repair call at temperature zero → re-validate →
//!       (on failure) safe fallback.
//!
//! The fallback path never raises: whatever the backend does, the caller
//! receives a usable, non-mutating proposal. Only a transport failure on the
//! FIRST call surfaces as an error, and the session layer absorbs that too.

use tracing::{debug, warn};

use crate::editing::payload::PayloadError;
use crate::editing::prompts::{
    EDIT_PROMPT_TEMPLATE, EDIT_SYSTEM, REPAIR_PROMPT_TEMPLATE, STRUCTURE_PROMPT_TEMPLATE,
    STRUCTURE_SYSTEM, TAILOR_PROMPT_TEMPLATE, TAILOR_SYSTEM,
};
use crate::editing::schema::{validate_proposal, validate_resume, EditProposal};
use crate::editing::session::{render_history, ChatTurn};
use crate::errors::AppError;
use crate::llm_client::prompts::{FIDELITY_INSTRUCTION, JSON_ONLY_SYSTEM, RESUME_SCHEMA_FRAGMENT};
use crate::llm_client::TextGenerator;
use crate::models::resume::Resume;

/// Temperature for first-pass edit/structure/tailor calls.
const GENERATION_TEMPERATURE: f32 = 0.2;
/// The repair retry is deterministic.
const REPAIR_TEMPERATURE: f32 = 0.0;
const MAX_OUTPUT_TOKENS: u32 = 4096;

/// Fixed reply used when both the first pass and the repair retry fail.
pub const FALLBACK_MESSAGE: &str = "Sorry — I couldn't apply that change reliably, \
    so I've left your resume untouched. Could you rephrase the request?";

/// Proposes an edit for `message` against the committed `current` document.
///
/// Extraction and validation failures are recovered by one repair retry and,
/// failing that, converted into the safe fallback proposal. The returned
/// proposal never mutates state by itself; committing happens in the session
/// layer after user confirmation.
pub async fn propose_edit(
    llm: &dyn TextGenerator,
    current: &Resume,
    message: &str,
    history: &[ChatTurn],
) -> Result<EditProposal, AppError> {
    let resume_json = to_pretty_json(current)?;
    let prompt = EDIT_PROMPT_TEMPLATE
        .replace("{fidelity_instruction}", FIDELITY_INSTRUCTION)
        .replace("{resume_schema}", RESUME_SCHEMA_FRAGMENT)
        .replace("{resume_json}", &resume_json)
        .replace("{history}", &render_history(history))
        .replace("{message}", message);

    let raw = llm
        .generate(&prompt, EDIT_SYSTEM, GENERATION_TEMPERATURE, MAX_OUTPUT_TOKENS)
        .await
        .map_err(|e| AppError::Llm(format!("Edit proposal call failed: {e}")))?;

    match validate_proposal(&raw) {
        Ok(proposal) => Ok(normalize_proposal(proposal, current)),
        Err(first_failure) => {
            warn!("Proposal payload invalid, issuing repair call: {first_failure}");
            match repair(llm, &prompt, &raw).await {
                Ok(repaired) => match validate_proposal(&repaired) {
                    Ok(proposal) => Ok(normalize_proposal(proposal, current)),
                    Err(second_failure) => {
                        warn!("Repair output still invalid, using fallback: {second_failure}");
                        Ok(fallback_proposal(current))
                    }
                },
                Err(transport) => {
                    warn!("Repair call failed, using fallback: {transport}");
                    Ok(fallback_proposal(current))
                }
            }
        }
    }
}

/// Structures raw extracted resume text into a document snapshot.
/// Same extraction/validation/repair ladder with the document schema as the
/// target; there is no committed document to fall back to here, so a double
/// failure surfaces as an error.
pub async fn structure_document(
    llm: &dyn TextGenerator,
    raw_text: &str,
    extra_experience: &str,
) -> Result<Resume, AppError> {
    let prompt = STRUCTURE_PROMPT_TEMPLATE
        .replace("{fidelity_instruction}", FIDELITY_INSTRUCTION)
        .replace("{resume_schema}", RESUME_SCHEMA_FRAGMENT)
        .replace("{raw_text}", raw_text)
        .replace("{extra}", extra_experience);

    validated_document_call(llm, STRUCTURE_SYSTEM, &prompt).await
}

/// Tailors the current document to a job description. Reuses the document
/// ladder; a double failure surfaces rather than silently returning the
/// untailored resume.
pub async fn tailor_document(
    llm: &dyn TextGenerator,
    current: &Resume,
    job_description: &str,
    job_title: &str,
    company: &str,
) -> Result<Resume, AppError> {
    let resume_json = to_pretty_json(current)?;
    let prompt = TAILOR_PROMPT_TEMPLATE
        .replace("{fidelity_instruction}", FIDELITY_INSTRUCTION)
        .replace("{resume_schema}", RESUME_SCHEMA_FRAGMENT)
        .replace("{resume_json}", &resume_json)
        .replace("{job_title}", job_title)
        .replace("{company}", company)
        .replace("{job_description}", job_description);

    validated_document_call(llm, TAILOR_SYSTEM, &prompt).await
}

/// Shared ladder for calls whose target schema is the document itself.
async fn validated_document_call(
    llm: &dyn TextGenerator,
    system: &str,
    prompt: &str,
) -> Result<Resume, AppError> {
    let raw = llm
        .generate(prompt, system, GENERATION_TEMPERATURE, MAX_OUTPUT_TOKENS)
        .await
        .map_err(|e| AppError::Llm(format!("Document call failed: {e}")))?;

    let first_failure = match validate_resume(&raw) {
        Ok(resume) => return Ok(resume),
        Err(err) => err,
    };

    warn!("Document payload invalid, issuing repair call: {first_failure}");
    let repaired = repair(llm, prompt, &raw)
        .await
        .map_err(|e| AppError::Llm(format!("Repair call failed: {e}")))?;

    validate_resume(&repaired).map_err(|second_failure: PayloadError| {
        AppError::Llm(format!(
            "Backend returned invalid document twice: {first_failure}; then: {second_failure}"
        ))
    })
}

/// The one-shot repair request: original instructions plus the invalid
/// output, under the strict JSON-only system prompt, at temperature zero.
async fn repair(
    llm: &dyn TextGenerator,
    original_prompt: &str,
    invalid_output: &str,
) -> Result<String, crate::llm_client::LlmError> {
    let prompt = REPAIR_PROMPT_TEMPLATE
        .replace("{original_prompt}", original_prompt)
        .replace("{invalid_output}", invalid_output);
    llm.generate(&prompt, JSON_ONLY_SYSTEM, REPAIR_TEMPERATURE, MAX_OUTPUT_TOKENS)
        .await
}

/// A proposal that does not ask for confirmation must not carry a mutated
/// snapshot: clarifying turns never silently change state. The backend is
/// instructed to echo the current resume in that case; this enforces it.
fn normalize_proposal(mut proposal: EditProposal, current: &Resume) -> EditProposal {
    if !proposal.needs_confirmation && proposal.proposed_resume != *current {
        debug!("Non-confirming proposal carried a mutated snapshot; restoring current document");
        proposal.proposed_resume = current.clone();
        proposal.edits_summary.clear();
    }
    proposal
}

/// The circuit-breaker result: apologetic, empty summary, current document,
/// no confirmation required.
pub fn fallback_proposal(current: &Resume) -> EditProposal {
    EditProposal {
        assistant_message: FALLBACK_MESSAGE.to_string(),
        edits_summary: Vec::new(),
        proposed_resume: current.clone(),
        needs_confirmation: false,
    }
}

fn to_pretty_json(resume: &Resume) -> Result<String, AppError> {
    serde_json::to_string_pretty(resume)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize resume: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted backend: pops one canned reply per call and counts calls.
    struct ScriptedBackend {
        replies: Mutex<Vec<Result<String, ()>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, ()>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedBackend {
        async fn generate(
            &self,
            _prompt: &str,
            _system: &str,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut replies = self.replies.lock().unwrap();
            assert!(!replies.is_empty(), "backend called more times than scripted");
            replies.remove(0).map_err(|_| LlmError::Api {
                status: 500,
                message: "scripted transport failure".to_string(),
            })
        }
    }

    fn current_resume() -> Resume {
        let mut resume = Resume::default();
        resume.header.name = "Ada Lovelace".to_string();
        resume
    }

    fn valid_proposal_text(current: &Resume) -> String {
        let mut proposed = current.clone();
        proposed.awards.push("Fellow of the Royal Society".to_string());
        format!(
            r#"{{
                "assistant_message": "I added the award — confirm?",
                "edits_summary": ["Added award: Fellow of the Royal Society"],
                "proposed_resume": {},
                "needs_confirmation": true
            }}"#,
            serde_json::to_string(&proposed).unwrap()
        )
    }

    #[tokio::test]
    async fn test_clean_first_pass_makes_one_call() {
        let current = current_resume();
        let backend = ScriptedBackend::new(vec![Ok(valid_proposal_text(&current))]);

        let proposal = propose_edit(&backend, &current, "add my award", &[])
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 1);
        assert!(proposal.needs_confirmation);
        assert_eq!(proposal.edits_summary.len(), 1);
        assert_ne!(proposal.proposed_resume, current);
    }

    #[tokio::test]
    async fn test_unbalanced_output_triggers_exactly_one_repair() {
        let current = current_resume();
        let backend = ScriptedBackend::new(vec![
            Ok(r#"{"assistant_message": "oops"#.to_string()),
            Ok(valid_proposal_text(&current)),
        ]);

        let proposal = propose_edit(&backend, &current, "add my award", &[])
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 2);
        assert!(proposal.needs_confirmation);
    }

    #[tokio::test]
    async fn test_double_failure_returns_safe_fallback() {
        let current = current_resume();
        let backend = ScriptedBackend::new(vec![
            Ok("no json here at all".to_string()),
            Ok("still not { valid".to_string()),
        ]);

        let proposal = propose_edit(&backend, &current, "add my award", &[])
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 2);
        assert_eq!(proposal.assistant_message, FALLBACK_MESSAGE);
        assert!(proposal.edits_summary.is_empty());
        assert_eq!(proposal.proposed_resume, current);
        assert!(!proposal.needs_confirmation);
    }

    #[tokio::test]
    async fn test_repair_transport_failure_returns_fallback() {
        let current = current_resume();
        let backend = ScriptedBackend::new(vec![Ok("not json".to_string()), Err(())]);

        let proposal = propose_edit(&backend, &current, "tighten bullets", &[])
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 2);
        assert_eq!(proposal.proposed_resume, current);
        assert!(!proposal.needs_confirmation);
    }

    #[tokio::test]
    async fn test_first_call_transport_failure_surfaces() {
        let current = current_resume();
        let backend = ScriptedBackend::new(vec![Err(())]);

        let result = propose_edit(&backend, &current, "tighten bullets", &[]).await;

        assert_eq!(backend.call_count(), 1);
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_clarifying_reply_never_mutates_snapshot() {
        let current = current_resume();
        let mut mutated = current.clone();
        mutated.header.name = "Someone Else".to_string();
        let reply = format!(
            r#"{{
                "assistant_message": "Which award do you mean?",
                "edits_summary": [],
                "proposed_resume": {},
                "needs_confirmation": false
            }}"#,
            serde_json::to_string(&mutated).unwrap()
        );
        let backend = ScriptedBackend::new(vec![Ok(reply)]);

        let proposal = propose_edit(&backend, &current, "add the award", &[])
            .await
            .unwrap();

        assert_eq!(proposal.proposed_resume, current);
        assert!(proposal.edits_summary.is_empty());
    }

    #[tokio::test]
    async fn test_structure_document_accepts_fenced_output() {
        let fenced = "```json\n{\"header\": {\"name\": \"Grace Hopper\"}}\n```";
        // Fences are tolerated on the first pass, so no repair call happens.
        let backend = ScriptedBackend::new(vec![Ok(fenced.to_string())]);

        let resume = structure_document(&backend, "GRACE HOPPER\nNavy...", "")
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 1);
        assert_eq!(resume.header.name, "Grace Hopper");
    }

    #[tokio::test]
    async fn test_structure_document_double_failure_errors() {
        let backend =
            ScriptedBackend::new(vec![Ok("nope".to_string()), Ok("{\"skills\": []".to_string())]);

        let result = structure_document(&backend, "raw text", "").await;

        assert_eq!(backend.call_count(), 2);
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_tailor_document_returns_full_snapshot() {
        let current = current_resume();
        let mut tailored = current.clone();
        tailored.skills.languages.push("Rust".to_string());
        let backend =
            ScriptedBackend::new(vec![Ok(serde_json::to_string(&tailored).unwrap())]);

        let result = tailor_document(&backend, &current, "Build Rust services", "Engineer", "Acme")
            .await
            .unwrap();

        assert_eq!(result, tailored);
    }
}
