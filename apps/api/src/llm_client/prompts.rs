// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Common instruction appended to every resume-mutating prompt.
pub const FIDELITY_INSTRUCTION: &str = "\
    CRITICAL: Do NOT invent employers, schools, titles, dates, metrics, or links. \
    If something is unknown, use \"\" or []. \
    Bullets should be concise, technical, and honest. \
    Preserve every fact the user did not ask you to change.";

/// The document schema every resume payload must match, embedded in prompts.
pub const RESUME_SCHEMA_FRAGMENT: &str = r#"{
  "header": {"name":"","email":"","phone":"","linkedin":"","github":"","portfolio":"","location":""},
  "education":[{"school":"","degree":"","major":"","grad":"","gpa":"","coursework":[]}],
  "skills":{"languages":[],"frameworks":[],"tools":[],"concepts":[],"groups":{}},
  "experience":[{"company":"","location":"","role":"","start":"","end":"","bullets":[]}],
  "projects":[{"name":"","link":"","stack":[],"start":"","end":"","bullets":[]}],
  "leadership":[{"org":"","title":"","start":"","end":"","bullets":[]}],
  "awards":[]
}"#;
