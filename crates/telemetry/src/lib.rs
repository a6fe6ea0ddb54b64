//! Token-usage accounting for CtxBot.
//!
//! One row per completion call goes to a CSV log. Accounting is
//! best-effort: a failed write is logged and never fails the call that
//! produced it.

pub mod usage;

pub use usage::{TemperatureUsed, UsageLog};
