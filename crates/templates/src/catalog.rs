//! Template catalog — typed load and prompt rendering.
//!
//! The catalog is an external, read-only JSON document. It is validated
//! here, at the load boundary, so the rest of the system works with typed
//! structs instead of trusting raw dictionaries at each access site.

use ctxbot_core::error::TemplateError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The catalog document: a task description and an ordered template list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptCatalog {
    /// Human-readable description of the overall task.
    #[serde(default)]
    pub task: String,

    /// The templates, in catalog order.
    #[serde(default)]
    pub prompts: Vec<PromptTemplate>,
}

/// One catalog entry. Only `id` and `name` are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Identifier, unique within the catalog.
    pub id: u32,

    /// Display name.
    pub name: String,

    /// System-level instruction text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Background the model should assume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// The question or task itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    /// Output-format instructions, appended to the system text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Example payload shown to the model as a sample answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

impl PromptCatalog {
    /// Load and validate the catalog from `path`.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Catalog {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let catalog: Self =
            serde_json::from_str(&content).map_err(|e| TemplateError::Catalog {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        catalog.validate().map_err(|reason| TemplateError::Catalog {
            path: path.display().to_string(),
            reason,
        })?;

        Ok(catalog)
    }

    fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for template in &self.prompts {
            if !seen.insert(template.id) {
                return Err(format!("duplicate template id {}", template.id));
            }
        }
        Ok(())
    }

    /// Look up a template by id.
    pub fn find(&self, id: u32) -> Option<&PromptTemplate> {
        self.prompts.iter().find(|t| t.id == id)
    }
}

impl PromptTemplate {
    /// Render the system message: role text, then format instructions,
    /// separated by a blank line; each part only when non-empty.
    pub fn system_text(&self) -> String {
        let role = self.role.as_deref().unwrap_or("").trim();
        let format = self.format.as_deref().unwrap_or("").trim();

        match (role.is_empty(), format.is_empty()) {
            (false, false) => format!("{role}\n\n{format}"),
            (false, true) => role.to_string(),
            (true, false) => format.to_string(),
            (true, true) => String::new(),
        }
    }

    /// Render the user message: context, task, and an optional canonical
    /// rendering of the example payload.
    pub fn user_text(&self) -> String {
        let mut text = format!(
            "Context: {}\n\nTask: {}",
            self.context.as_deref().unwrap_or(""),
            self.question.as_deref().unwrap_or("")
        );

        if let Some(example) = &self.example {
            let rendered =
                serde_json::to_string_pretty(example).unwrap_or_else(|_| example.to_string());
            text.push_str("\n\nExample answer:\n");
            text.push_str(&rendered);
        }

        text
    }
}
