//! `ctxbot onboard` — write a default config and a sample template catalog.

use ctxbot_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    std::fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        println!("Config already exists: {}", config_path.display());
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("Wrote default config: {}", config_path.display());
    }

    let prompts_path = AppConfig::default().prompts_path();
    if prompts_path.exists() {
        println!("Template catalog already exists: {}", prompts_path.display());
    } else {
        std::fs::write(&prompts_path, SAMPLE_CATALOG)?;
        println!("Wrote sample template catalog: {}", prompts_path.display());
    }

    println!();
    println!("Next steps:");
    println!("  1. Set CTXBOT_API_KEY (or OPENAI_API_KEY)");
    println!("  2. For the Telegram bot, set CTXBOT_BOT_TOKEN (or BOT_TOKEN)");
    println!("  3. Run `ctxbot chat` or `ctxbot bot`");

    Ok(())
}

const SAMPLE_CATALOG: &str = r#"{
  "task": "Elicit structured JSON answers for a fixed task.",
  "prompts": [
    {
      "id": 1,
      "name": "City facts",
      "role": "You are a precise geography assistant.",
      "context": "The user is building a small trivia collection.",
      "question": "Name three interesting facts about Prague.",
      "format": "Reply with a JSON object: {\"facts\": [\"...\", \"...\", \"...\"]}. No prose outside the JSON.",
      "example": { "facts": ["fact one", "fact two", "fact three"] }
    },
    {
      "id": 2,
      "name": "Book summary",
      "role": "You are a concise literary critic.",
      "context": "The user wants machine-readable book notes.",
      "question": "Summarize 'The Master and Margarita' in one sentence and rate it 1-10.",
      "format": "Reply with a JSON object: {\"summary\": \"...\", \"rating\": 0}."
    }
  ]
}
"#;
