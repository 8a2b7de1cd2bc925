use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use crate::config::Config;
use crate::editing::intent::IntentClassifier;
use crate::jobs::JobSearchClient;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub s3: S3Client,
    pub llm: LlmClient,
    pub config: Config,
    /// Pluggable intent classifier. Default: RegexIntentClassifier.
    pub classifier: Arc<dyn IntentClassifier>,
    /// Pluggable job search backend. DisabledJobSearch when no key is set.
    pub jobs: Arc<dyn JobSearchClient>,
}
