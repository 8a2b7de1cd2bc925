//! Resume intake: text extraction from uploads and the heuristic bootstrap
//! parse that seeds a document before LLM structuring.

pub mod handlers;

use regex::Regex;

use crate::errors::AppError;
use crate::models::resume::Resume;

/// Extracts plain text from an uploaded file.
///
/// PDF goes through `pdf-extract`; plain text passes through. Anything else
/// is rejected with `UnsupportedFormat` — missing input, not backend
/// flakiness, so it surfaces to the caller unretried.
pub fn extract_text(filename: &str, data: &[u8]) -> Result<String, AppError> {
    let lower = filename.to_lowercase();

    if lower.ends_with(".pdf") {
        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| AppError::UnsupportedFormat(format!("Could not read PDF: {e}")))?;
        return Ok(text.trim().to_string());
    }

    if lower.ends_with(".txt") {
        return Ok(String::from_utf8_lossy(data).trim().to_string());
    }

    Err(AppError::UnsupportedFormat(
        "Unsupported file type. Upload PDF or TXT.".to_string(),
    ))
}

/// Seeds a minimal document from raw text: first non-blank line as the name,
/// first email/phone match for contact. Everything else starts empty and is
/// filled by the LLM structuring pass or by chat edits.
pub fn bootstrap_resume(raw: &str) -> Resume {
    let email_re = Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("email pattern is valid");
    let phone_re = Regex::new(r"(\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}")
        .expect("phone pattern is valid");

    let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let text = lines.join("\n");

    let mut resume = Resume::default();
    resume.header.name = lines.first().copied().unwrap_or_default().to_string();
    resume.header.email = email_re
        .find(&text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    resume.header.phone = phone_re
        .find(&text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    resume
}
