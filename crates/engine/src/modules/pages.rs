//! Pages: the `send_to_page` action.

use std::sync::Arc;

use serde_json::{Map, Value};

use tripwright_domain::{ActionContext, ResultOp};

use crate::error::KernelError;
use crate::registry::{ActionHandler, Params, Registry};

pub fn register(registry: &mut Registry) {
    registry.register_action("send_to_page", Arc::new(SendToPage));
}

/// Navigate a role to a page. An empty page name clears the role's
/// current page.
struct SendToPage;

impl ActionHandler for SendToPage {
    fn get_ops(&self, params: &Params, ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let role_name = params.get("role_name").and_then(Value::as_str).unwrap_or("");
        if ctx.script_content.role(role_name).is_none() {
            return Ok(vec![ResultOp::log_error(format!(
                "Could not find role named \"{role_name}\"."
            ))]);
        }
        let page_name = params.get("page_name").and_then(Value::as_str).unwrap_or("");

        let mut fields = Map::new();
        fields.insert(
            "currentPageName".to_string(),
            Value::String(page_name.to_string()),
        );
        Ok(vec![ResultOp::UpdatePlayerFields {
            role_name: role_name.to_string(),
            fields,
        }])
    }
}
