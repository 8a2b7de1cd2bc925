//! Conversation session — the edit confirmation state machine.
//!
//! Mediates between free-text user intent and committed document mutations.
//! No edit is ever applied without explicit confirmation: a proposal is
//! parked as the single pending edit for the document, and only an
//! affirmative follow-up commits it. All state (document snapshots, pending
//! edit, chat history) is read from storage at the start of a turn and
//! written back at the end; nothing is held in process memory.

use aws_sdk_s3::Client as S3Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::editing::intent::{normalize_request, Intent, IntentClassifier};
use crate::editing::proposal::propose_edit;
use crate::editing::schema::EditProposal;
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::models::resume::Resume;
use crate::storage::{self, keys, StorageError};

/// Number of trailing turns supplied to the backend. History storage itself
/// is unbounded; only the prompt window is capped.
pub const HISTORY_WINDOW: usize = 12;

pub const APPLIED_REPLY: &str = "Done — I've applied the changes to your resume.";
pub const REJECTED_REPLY: &str =
    "No problem — I've discarded that proposal. Your resume is unchanged.";
pub const NO_CHANGE_REPLY: &str =
    "Great — I'll leave the resume as it is. Ask me any time you want another pass.";
pub const RETRY_GUIDANCE_REPLY: &str = "Something went wrong while processing that request. \
    Your resume is unchanged — please try rephrasing.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    Pending,
    Applied,
    Rejected,
}

/// The single outstanding unconfirmed edit for a document. A new proposal
/// always overwrites the previous record, whatever its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEdit {
    pub status: PendingStatus,
    pub resume: Resume,
    pub edits_summary: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Renders the trailing history window as plain dialogue lines for the
/// prompt. Older turns are dropped to bound prompt size.
pub fn render_history(history: &[ChatTurn]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut out = String::new();
    for turn in &history[start..] {
        let speaker = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        out.push_str(speaker);
        out.push_str(": ");
        out.push_str(&turn.content);
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str("(no prior conversation)\n");
    }
    out
}

/// The resolved action for one user turn. Computed by `decide` as a pure
/// function of intent and pending state, so the transition rules are a
/// decision table rather than logic buried in IO.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    /// Commit the pending snapshot as the new document.
    ApplyPending(PendingEdit),
    /// Mark the pending edit rejected; document unchanged.
    RejectPending(PendingEdit),
    /// Fixed acknowledgment; no backend call.
    AcknowledgeNoChange,
    /// Run the proposal pipeline with the (possibly expanded) request.
    Propose(String),
}

/// Transition rules, evaluated in precedence order:
/// 1. live pending + affirmative → apply
/// 2. live pending + negative    → reject
/// 3. no pending + no-change     → acknowledge without any backend call
/// 4. everything else            → a fresh editing request (terse broad
///    requests are expanded first)
///
/// Ambiguous input — including confirmation words when nothing is pending —
/// always falls through to rule 4.
pub fn decide(intent: Intent, live_pending: Option<PendingEdit>, message: &str) -> ChatAction {
    match (intent, live_pending) {
        (Intent::Affirmative, Some(edit)) => ChatAction::ApplyPending(edit),
        (Intent::Negative, Some(edit)) => ChatAction::RejectPending(edit),
        (Intent::NoChange, None) => ChatAction::AcknowledgeNoChange,
        _ => ChatAction::Propose(normalize_request(message)),
    }
}

/// Handles one user turn against a document's conversation.
///
/// All state is read up front and written back at the end; the user message
/// and the chosen reply are appended to history on every branch. Pipeline
/// errors degrade to retry guidance; this function never lets a backend
/// failure take down the conversation.
pub async fn handle_chat_turn(
    s3: &S3Client,
    bucket: &str,
    llm: &dyn TextGenerator,
    classifier: &dyn IntentClassifier,
    doc_id: &str,
    message: &str,
) -> Result<EditProposal, AppError> {
    let current = storage::load_latest_resume(s3, bucket, doc_id).await?;
    let mut history = load_history(s3, bucket, doc_id).await?;
    let live_pending = load_pending(s3, bucket, doc_id)
        .await?
        .filter(|p| p.status == PendingStatus::Pending);

    let response = match decide(classifier.classify(message), live_pending, message) {
        ChatAction::ApplyPending(mut edit) => {
            storage::store_resume(s3, bucket, &keys::draft(doc_id), &edit.resume).await?;
            edit.status = PendingStatus::Applied;
            let committed = edit.resume.clone();
            save_pending(s3, bucket, doc_id, &edit).await?;
            info!("Applied pending edit for document {doc_id}");
            EditProposal {
                assistant_message: APPLIED_REPLY.to_string(),
                edits_summary: Vec::new(),
                proposed_resume: committed,
                needs_confirmation: false,
            }
        }
        ChatAction::RejectPending(mut edit) => {
            edit.status = PendingStatus::Rejected;
            save_pending(s3, bucket, doc_id, &edit).await?;
            info!("Rejected pending edit for document {doc_id}");
            EditProposal {
                assistant_message: REJECTED_REPLY.to_string(),
                edits_summary: Vec::new(),
                proposed_resume: current.clone(),
                needs_confirmation: false,
            }
        }
        ChatAction::AcknowledgeNoChange => EditProposal {
            assistant_message: NO_CHANGE_REPLY.to_string(),
            edits_summary: Vec::new(),
            proposed_resume: current.clone(),
            needs_confirmation: false,
        },
        ChatAction::Propose(request) => {
            match propose_edit(llm, &current, &request, &history).await {
                Ok(proposal) => {
                    if proposal.needs_confirmation {
                        let edit = PendingEdit {
                            status: PendingStatus::Pending,
                            resume: proposal.proposed_resume.clone(),
                            edits_summary: proposal.edits_summary.clone(),
                        };
                        save_pending(s3, bucket, doc_id, &edit).await?;
                    }
                    proposal
                }
                Err(err) => {
                    warn!("Proposal pipeline failed for document {doc_id}: {err}");
                    EditProposal {
                        assistant_message: RETRY_GUIDANCE_REPLY.to_string(),
                        edits_summary: Vec::new(),
                        proposed_resume: current.clone(),
                        needs_confirmation: false,
                    }
                }
            }
        }
    };

    history.push(ChatTurn {
        role: Role::User,
        content: message.to_string(),
    });
    history.push(ChatTurn {
        role: Role::Assistant,
        content: response.assistant_message.clone(),
    });
    save_history(s3, bucket, doc_id, &history).await?;

    Ok(response)
}

/// Commits the live pending edit outside the chat flow (explicit endpoint).
pub async fn apply_pending(s3: &S3Client, bucket: &str, doc_id: &str) -> Result<Resume, AppError> {
    let mut edit = load_pending(s3, bucket, doc_id)
        .await?
        .filter(|p| p.status == PendingStatus::Pending)
        .ok_or_else(|| {
            AppError::Validation(format!("No pending edit to apply for document {doc_id}"))
        })?;

    storage::store_resume(s3, bucket, &keys::draft(doc_id), &edit.resume).await?;
    edit.status = PendingStatus::Applied;
    let committed = edit.resume.clone();
    save_pending(s3, bucket, doc_id, &edit).await?;
    Ok(committed)
}

/// Rejects the live pending edit outside the chat flow (explicit endpoint).
pub async fn reject_pending(s3: &S3Client, bucket: &str, doc_id: &str) -> Result<(), AppError> {
    let mut edit = load_pending(s3, bucket, doc_id)
        .await?
        .filter(|p| p.status == PendingStatus::Pending)
        .ok_or_else(|| {
            AppError::Validation(format!("No pending edit to reject for document {doc_id}"))
        })?;

    edit.status = PendingStatus::Rejected;
    save_pending(s3, bucket, doc_id, &edit).await?;
    Ok(())
}

async fn load_pending(
    s3: &S3Client,
    bucket: &str,
    doc_id: &str,
) -> Result<Option<PendingEdit>, AppError> {
    match storage::get_object(s3, bucket, &keys::pending_edit(doc_id)).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(edit) => Ok(Some(edit)),
            Err(e) => {
                // A corrupt pending record must not wedge the conversation.
                warn!("Discarding unparseable pending edit for {doc_id}: {e}");
                Ok(None)
            }
        },
        Err(StorageError::NotFound(_)) => Ok(None),
        Err(other) => Err(other.into()),
    }
}

async fn save_pending(
    s3: &S3Client,
    bucket: &str,
    doc_id: &str,
    edit: &PendingEdit,
) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(edit)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize pending edit: {e}")))?;
    storage::put_object(s3, bucket, &keys::pending_edit(doc_id), payload, "application/json")
        .await?;
    Ok(())
}

async fn load_history(
    s3: &S3Client,
    bucket: &str,
    doc_id: &str,
) -> Result<Vec<ChatTurn>, AppError> {
    match storage::get_object(s3, bucket, &keys::chat_history(doc_id)).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_default()),
        Err(StorageError::NotFound(_)) => Ok(Vec::new()),
        Err(other) => Err(other.into()),
    }
}

async fn save_history(
    s3: &S3Client,
    bucket: &str,
    doc_id: &str,
    history: &[ChatTurn],
) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(history)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize history: {e}")))?;
    storage::put_object(s3, bucket, &keys::chat_history(doc_id), payload, "application/json")
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: Role, content: &str) -> ChatTurn {
        ChatTurn {
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_render_history_formats_dialogue() {
        let history = vec![
            turn(Role::User, "add my phone number"),
            turn(Role::Assistant, "What is the number?"),
        ];
        let rendered = render_history(&history);
        assert_eq!(
            rendered,
            "User: add my phone number\nAssistant: What is the number?\n"
        );
    }

    #[test]
    fn test_render_history_truncates_to_window() {
        let history: Vec<ChatTurn> = (0..30)
            .map(|i| turn(Role::User, &format!("message {i}")))
            .collect();
        let rendered = render_history(&history);
        assert!(!rendered.contains("message 17"));
        assert!(rendered.contains("message 18"));
        assert!(rendered.contains("message 29"));
        assert_eq!(rendered.lines().count(), HISTORY_WINDOW);
    }

    #[test]
    fn test_render_history_empty_placeholder() {
        assert_eq!(render_history(&[]), "(no prior conversation)\n");
    }

    fn pending_edit() -> PendingEdit {
        let mut resume = Resume::default();
        resume.awards.push("Turing Award".to_string());
        PendingEdit {
            status: PendingStatus::Pending,
            resume,
            edits_summary: vec!["Added award: Turing Award".to_string()],
        }
    }

    #[test]
    fn test_decide_affirmative_with_pending_applies() {
        let edit = pending_edit();
        let action = decide(Intent::Affirmative, Some(edit.clone()), "yes");
        assert_eq!(action, ChatAction::ApplyPending(edit));
    }

    #[test]
    fn test_decide_negative_with_pending_rejects() {
        let edit = pending_edit();
        let action = decide(Intent::Negative, Some(edit.clone()), "no");
        assert_eq!(action, ChatAction::RejectPending(edit));
    }

    #[test]
    fn test_decide_no_change_without_pending_skips_backend() {
        // AcknowledgeNoChange carries no request: zero backend calls.
        let action = decide(Intent::NoChange, None, "looks good");
        assert_eq!(action, ChatAction::AcknowledgeNoChange);
    }

    #[test]
    fn test_decide_no_change_with_pending_falls_through() {
        let action = decide(Intent::NoChange, Some(pending_edit()), "looks good");
        assert!(matches!(action, ChatAction::Propose(_)));
    }

    #[test]
    fn test_decide_affirmative_without_pending_is_a_request() {
        let action = decide(Intent::Affirmative, None, "yes");
        assert!(matches!(action, ChatAction::Propose(_)));
    }

    #[test]
    fn test_decide_other_with_pending_is_a_request() {
        // Ambiguous input never counts as a response to the pending proposal.
        let action = decide(Intent::Other, Some(pending_edit()), "also add my phone");
        assert_eq!(
            action,
            ChatAction::Propose("also add my phone".to_string())
        );
    }

    #[test]
    fn test_decide_expands_terse_broad_requests() {
        match decide(Intent::Other, None, "fix bullets") {
            ChatAction::Propose(request) => {
                assert!(request.contains("bullet points"));
                assert_ne!(request, "fix bullets");
            }
            other => panic!("expected Propose, got {other:?}"),
        }
    }

    #[test]
    fn test_pending_status_serializes_lowercase() {
        let edit = PendingEdit {
            status: PendingStatus::Pending,
            resume: Resume::default(),
            edits_summary: vec!["Added award".to_string()],
        };
        let json = serde_json::to_string(&edit).unwrap();
        assert!(json.contains("\"status\":\"pending\""));

        let recovered: PendingEdit = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.status, PendingStatus::Pending);
    }

    #[test]
    fn test_pending_status_transitions_round_trip() {
        for (status, text) in [
            (PendingStatus::Applied, "\"applied\""),
            (PendingStatus::Rejected, "\"rejected\""),
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, text);
        }
    }
}
