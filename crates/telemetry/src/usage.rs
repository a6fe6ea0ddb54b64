//! Append-only CSV usage log.
//!
//! Columns: `run_id,datetime,model,temperature,prompt_tokens,
//! completion_tokens,total_tokens`. The header is written when the file is
//! first created. Run ids come from a process-local counter starting at 1;
//! they are not persisted across restarts, and the counter advances even
//! when a write fails, so gaps in recorded ids are possible.

use chrono::Local;
use ctxbot_core::Usage;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// The temperature that was actually in effect for a completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemperatureUsed {
    /// The numeric value sent with the request.
    Value(f32),
    /// The service's own default — the supplied value was rejected as
    /// unsupported and the request was retried without it.
    Default,
}

impl std::fmt::Display for TemperatureUsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(t) => write!(f, "{t}"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Best-effort accounting log for completion calls.
pub struct UsageLog {
    path: PathBuf,
    run_counter: AtomicU64,
}

impl UsageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            run_counter: AtomicU64::new(0),
        }
    }

    /// Append one accounting row and return the run id assigned to it.
    ///
    /// Never raises: an I/O failure is logged as a warning and the counter
    /// still advances, so a skipped write shows up as a gap in run ids
    /// rather than as an error on the completion path.
    pub fn record(&self, model: &str, temperature: TemperatureUsed, usage: &Usage) -> u64 {
        let run_id = self.run_counter.fetch_add(1, Ordering::SeqCst) + 1;
        match self.append_row(run_id, model, temperature, usage) {
            Ok(()) => debug!(run_id, model, "Usage recorded"),
            Err(e) => warn!(
                run_id,
                path = %self.path.display(),
                error = %e,
                "Failed to write usage log row"
            ),
        }
        run_id
    }

    fn append_row(
        &self,
        run_id: u64,
        model: &str,
        temperature: TemperatureUsed,
        usage: &Usage,
    ) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let existed = self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if !existed {
            writeln!(
                file,
                "run_id,datetime,model,temperature,prompt_tokens,completion_tokens,total_tokens"
            )?;
        }

        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            run_id,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            model,
            temperature,
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens
        )
    }
}
