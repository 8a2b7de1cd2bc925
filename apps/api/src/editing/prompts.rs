// All LLM prompt constants for the editing module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for chat edit proposals — enforces JSON-only output.
pub const EDIT_SYSTEM: &str = "You are a careful resume editor. \
    The user asks for changes in plain language; you propose a complete \
    updated resume snapshot and wait for confirmation. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies outside the assistant_message field.";

/// Chat edit prompt template.
/// Replace: {fidelity_instruction}, {resume_schema}, {resume_json},
///          {history}, {message}
pub const EDIT_PROMPT_TEMPLATE: &str = r#"{fidelity_instruction}

You are editing the resume below based on the user's latest message.

Return a JSON object with this EXACT schema (no extra fields):
{
  "assistant_message": "short reply shown to the user",
  "edits_summary": ["one short line per change"],
  "proposed_resume": {resume_schema},
  "needs_confirmation": true
}

HARD RULES:
1. `proposed_resume` must be the COMPLETE updated resume, not a partial patch
2. If you propose any change, set `needs_confirmation` to true and list every
   change in `edits_summary`
3. If you are only answering a question or asking for clarification, return
   the current resume UNCHANGED in `proposed_resume`, an empty
   `edits_summary`, and `needs_confirmation` false
4. If the contact header is largely empty, you may ask for those details in
   `assistant_message`, but never block an edit on it

CURRENT RESUME:
{resume_json}

RECENT CONVERSATION:
{history}

USER MESSAGE:
{message}"#;

/// Repair prompt template for the one-shot retry after invalid output.
/// Replace: {original_prompt}, {invalid_output}
pub const REPAIR_PROMPT_TEMPLATE: &str = r#"Your previous reply could not be parsed as the required JSON.

ORIGINAL INSTRUCTIONS:
{original_prompt}

YOUR INVALID REPLY:
{invalid_output}

Return the corrected JSON object ONLY. No commentary, no markdown fences,
no text before or after the object."#;

/// System prompt for first-pass structuring of extracted resume text.
pub const STRUCTURE_SYSTEM: &str = "You are an expert resume parser. \
    You convert raw resume text into a structured JSON document. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Structuring prompt template.
/// Replace: {fidelity_instruction}, {resume_schema}, {raw_text}, {extra}
pub const STRUCTURE_PROMPT_TEMPLATE: &str = r#"{fidelity_instruction}

JSON schema (must match exactly):
{resume_schema}

RESUME TEXT:
{raw_text}

EXTRA EXPERIENCE (optional):
{extra}"#;

/// System prompt for tailoring a resume to a specific job description.
pub const TAILOR_SYSTEM: &str = "You are an expert resume strategist. \
    You reorder and rephrase existing resume content to fit a target job, \
    without inventing anything. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Tailoring prompt template.
/// Replace: {fidelity_instruction}, {resume_schema}, {resume_json},
///          {job_title}, {company}, {job_description}
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"{fidelity_instruction}

Tailor the resume below for the target job. Emphasize relevant experience,
reorder bullets so the strongest matches lead, and fold in the job's
vocabulary ONLY where the underlying fact already exists in the resume.

Return the COMPLETE tailored resume as a JSON object with this schema:
{resume_schema}

TARGET JOB: {job_title} at {company}

JOB DESCRIPTION:
{job_description}

CURRENT RESUME:
{resume_json}"#;
