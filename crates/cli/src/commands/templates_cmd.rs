//! `ctxbot templates` — list the catalog or run a single template.

use crate::commands::{build_gateway, build_runner};
use ctxbot_config::AppConfig;
use ctxbot_templates::PromptCatalog;

pub fn list() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let catalog = PromptCatalog::load(&config.prompts_path())?;

    println!("Task: {}", catalog.task);
    println!();
    for template in &catalog.prompts {
        println!("  {}: {}", template.id, template.name);
    }
    println!();
    println!("Run one with: ctxbot templates run <id>");
    Ok(())
}

pub async fn run(id: u32) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let gateway = build_gateway(&config)?;
    let runner = build_runner(&config, gateway)?;

    let outcome = runner.run(id).await?;

    println!(
        "Valid JSON: {}",
        if outcome.parsed { "yes" } else { "no" }
    );
    println!(
        "Tokens: prompt {}, completion {}, total {}",
        outcome.usage.prompt_tokens, outcome.usage.completion_tokens, outcome.usage.total_tokens
    );
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&outcome.result)
            .unwrap_or_else(|_| outcome.result.to_string())
    );
    println!();
    println!(
        "Result appended to {}",
        config.template_results_path().display()
    );
    Ok(())
}
