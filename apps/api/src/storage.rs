//! Blob storage collaborator.
//!
//! All durable state — uploads, extracted text, resume snapshots, pending
//! edits, chat history — lives here, keyed by document id with per-key
//! overwrite semantics. There is no other persistence layer: a request reads
//! what it needs at the start and writes results at the end, so documents
//! stay independent and last-write-wins per key.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::models::resume::Resume;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage operation failed: {0}")]
    Other(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(key),
            StorageError::Other(msg) => AppError::Storage(msg),
        }
    }
}

pub async fn put_object(
    s3: &S3Client,
    bucket: &str,
    key: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<(), StorageError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| StorageError::Other(format!("put s3://{bucket}/{key}: {e}")))?;
    debug!("Wrote s3://{}/{}", bucket, key);
    Ok(())
}

pub async fn get_object(s3: &S3Client, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
    let out = match s3.get_object().bucket(bucket).key(key).send().await {
        Ok(out) => out,
        Err(err) => {
            let service = err.into_service_error();
            if service.is_no_such_key() {
                return Err(StorageError::NotFound(key.to_string()));
            }
            return Err(StorageError::Other(format!(
                "get s3://{bucket}/{key}: {service}"
            )));
        }
    };

    let data = out
        .body
        .collect()
        .await
        .map_err(|e| StorageError::Other(format!("read s3://{bucket}/{key}: {e}")))?;
    Ok(data.into_bytes().to_vec())
}

// ────────────────────────────────────────────────────────────────────────────
// Document-keyed layout
// ────────────────────────────────────────────────────────────────────────────

pub mod keys {
    pub fn upload(doc_id: &str, filename: &str) -> String {
        format!("uploads/{doc_id}/{filename}")
    }

    pub fn extracted_text(doc_id: &str) -> String {
        format!("extracted/{doc_id}/resume.txt")
    }

    pub fn parsed(doc_id: &str) -> String {
        format!("parsed/{doc_id}/resume.json")
    }

    pub fn structured(doc_id: &str) -> String {
        format!("structured/{doc_id}/resume.json")
    }

    pub fn tailored(doc_id: &str) -> String {
        format!("tailored/{doc_id}/resume.json")
    }

    pub fn draft(doc_id: &str) -> String {
        format!("draft/{doc_id}/resume.json")
    }

    pub fn pending_edit(doc_id: &str) -> String {
        format!("pending/{doc_id}/edit.json")
    }

    pub fn chat_history(doc_id: &str) -> String {
        format!("chat/{doc_id}/history.json")
    }

    pub fn rendered(doc_id: &str) -> String {
        format!("rendered/{doc_id}/resume.tex")
    }
}

/// Loads the most current resume snapshot for a document, preferring the
/// chat draft, then tailored, then structured, then the heuristic parse.
pub async fn load_latest_resume(
    s3: &S3Client,
    bucket: &str,
    doc_id: &str,
) -> Result<Resume, AppError> {
    let candidates = [
        keys::draft(doc_id),
        keys::tailored(doc_id),
        keys::structured(doc_id),
        keys::parsed(doc_id),
    ];

    for key in &candidates {
        match get_object(s3, bucket, key).await {
            Ok(bytes) => {
                if let Ok(resume) = serde_json::from_slice::<Resume>(&bytes) {
                    return Ok(resume);
                }
                // A corrupt snapshot falls through to the next candidate.
                tracing::warn!("Skipping unparseable snapshot at {}", key);
            }
            Err(StorageError::NotFound(_)) => continue,
            Err(other) => return Err(other.into()),
        }
    }

    Err(AppError::NotFound(format!(
        "No resume found for document {doc_id}. Parse or structure the resume first."
    )))
}

/// Writes a resume snapshot as pretty-printed JSON.
pub async fn store_resume(
    s3: &S3Client,
    bucket: &str,
    key: &str,
    resume: &Resume,
) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(resume)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize resume: {e}")))?;
    put_object(s3, bucket, key, payload, "application/json").await?;
    Ok(())
}
