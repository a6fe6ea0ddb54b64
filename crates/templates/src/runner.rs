//! Template execution and result persistence.

use crate::catalog::PromptCatalog;
use ctxbot_core::error::{Error, TemplateError};
use ctxbot_core::message::Message;
use ctxbot_core::provider::Usage;
use ctxbot_providers::{CompletionGateway, CompletionOptions};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// What one template run produced.
#[derive(Debug, Clone)]
pub struct TemplateOutcome {
    /// The decoded reply, or an error descriptor when decoding failed.
    pub result: serde_json::Value,
    /// Token usage for the underlying completion call.
    pub usage: Usage,
    /// Whether the reply was valid JSON.
    pub parsed: bool,
}

/// One persisted entry in the results document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRunRecord {
    pub template_id: u32,
    pub datetime: String,
    pub usage: Usage,
    pub parsed: bool,
    pub result: serde_json::Value,
    /// The unmodified reply text, kept only when parsing failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

/// Runs catalog templates through the completion gateway and persists the
/// outcomes.
///
/// Each run is stateless aside from the catalog and the results document;
/// the conversation context is never involved.
pub struct TemplateRunner {
    catalog: PromptCatalog,
    gateway: Arc<CompletionGateway>,
    results_path: PathBuf,
}

impl TemplateRunner {
    pub fn new(
        catalog: PromptCatalog,
        gateway: Arc<CompletionGateway>,
        results_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            gateway,
            results_path: results_path.into(),
        }
    }

    /// The loaded catalog (for listing on the entry surfaces).
    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    /// Run the template with the given id.
    ///
    /// An unknown id is the one error raised directly — there is no
    /// meaningful partial result for it. A reply that fails to decode as
    /// JSON is *not* an error: the run completes with `parsed = false` and
    /// the raw text preserved in the persisted record.
    pub async fn run(&self, template_id: u32) -> Result<TemplateOutcome, Error> {
        let template = self
            .catalog
            .find(template_id)
            .ok_or(TemplateError::NotFound(template_id))?;

        let system = template.system_text();
        let user = template.user_text();

        info!(template_id, name = %template.name, "Running template");

        let completion = self
            .gateway
            .complete(
                vec![Message::user(user)],
                CompletionOptions {
                    system_message: Some(system),
                    ..CompletionOptions::default()
                },
            )
            .await
            .map_err(Error::Provider)?;

        let (parsed, result) = match serde_json::from_str::<serde_json::Value>(&completion.text) {
            Ok(value) => (true, value),
            Err(e) => {
                warn!(template_id, error = %e, "Reply is not valid JSON");
                (
                    false,
                    serde_json::json!({
                        "error": format!("invalid JSON: {e}"),
                        "raw": completion.text,
                    }),
                )
            }
        };

        let record = TemplateRunRecord {
            template_id,
            datetime: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            usage: completion.usage,
            parsed,
            result: result.clone(),
            raw_text: (!parsed).then(|| completion.text.clone()),
        };
        self.persist(record)?;

        Ok(TemplateOutcome {
            result,
            usage: completion.usage,
            parsed,
        })
    }

    /// Append `record` to the results document: read the existing list (or
    /// start empty), push, rewrite the whole document. Low-volume only —
    /// not safe for concurrent writers.
    fn persist(&self, record: TemplateRunRecord) -> Result<(), TemplateError> {
        let persist_err = |reason: String| TemplateError::Persist {
            path: self.results_path.display().to_string(),
            reason,
        };

        let mut records = read_records(&self.results_path).map_err(&persist_err)?;
        records.push(record);

        if let Some(parent) = self.results_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| persist_err(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(&records)
            .map_err(|e| persist_err(e.to_string()))?;
        std::fs::write(&self.results_path, content).map_err(|e| persist_err(e.to_string()))?;

        Ok(())
    }
}

fn read_records(path: &Path) -> Result<Vec<TemplateRunRecord>, String> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| e.to_string())
}
