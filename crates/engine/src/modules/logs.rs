//! The `log` action: an authoring aid for leaving breadcrumbs in the
//! op stream.

use std::sync::Arc;

use serde_json::Value;

use tripwright_domain::{ActionContext, LogLevel, ResultOp};

use crate::error::KernelError;
use crate::eval::template_text;
use crate::registry::{ActionHandler, Params, Registry};

pub fn register(registry: &mut Registry) {
    registry.register_action("log", Arc::new(Log));
}

struct Log;

impl ActionHandler for Log {
    fn get_ops(&self, params: &Params, ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let level = match params.get("level").and_then(Value::as_str) {
            Some("error") => LogLevel::Error,
            Some("warning") => LogLevel::Warning,
            _ => LogLevel::Info,
        };
        let message = template_text(
            &ctx.eval_context,
            params.get("message").unwrap_or(&Value::Null),
            ctx.timezone,
        );
        Ok(vec![ResultOp::Log { level, message }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::action_context_with;
    use serde_json::json;

    #[test]
    fn test_log_templates_message() {
        let ctx = action_context_with(json!({}), json!({ "name": "Sarai" }));
        let params: Params = serde_json::from_value(json!({
            "level": "warning",
            "message": "hello {{name}}"
        }))
        .expect("params");

        let ops = Log.get_ops(&params, &ctx).expect("ops");
        assert_eq!(
            ops,
            vec![ResultOp::Log {
                level: LogLevel::Warning,
                message: "hello Sarai".to_string()
            }]
        );
    }
}
