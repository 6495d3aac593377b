//! Shared builders for kernel tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use tripwright_domain::{ActionContext, EvalContext, ScriptContent};

/// Initialize test logging; repeat calls are no-ops. Set `RUST_LOG` to
/// see kernel cascade traces while debugging a test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A fixed evaluation timestamp so expected history entries and
/// schedule math are stable across tests.
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("fixed timestamp should be valid")
}

/// The RFC 3339 form the kernel writes into history entries.
pub fn fixed_now_iso() -> String {
    fixed_now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// An action context over a JSON script and JSON eval-context values,
/// evaluated at [`fixed_now`].
pub fn action_context_with(script: Value, eval_values: Value) -> ActionContext {
    let script: ScriptContent =
        serde_json::from_value(script).expect("fixture script should deserialize");
    let eval_context: EvalContext =
        serde_json::from_value(eval_values).expect("fixture context should deserialize");
    ActionContext::new(Arc::new(script), eval_context, fixed_now())
}
