//! Action-clause resolution.
//!
//! A trigger's action tree nests conditional branches arbitrarily.
//! Resolution picks the first passing branch at each conditional
//! (`if`, then `elseifs` in order, then `else`) and recursively
//! flattens the survivors into one ordered action list. Order is a
//! correctness invariant: later actions execute after earlier ones
//! within the same trigger.
//!
//! Malformed shapes (a selected branch without an action list) are
//! fatal configuration errors - the resolver assumes its input already
//! passed static validation.

use tripwright_domain::{ActionClause, ActionContext, IfStatement, Trigger};

use crate::error::KernelError;
use crate::eval::Evaluator;

/// Resolve a trigger's action tree into a flat, ordered list of leaf
/// action clauses, given the context as of trigger activation.
pub fn actions_for_trigger(
    trigger: &Trigger,
    ctx: &ActionContext,
    evaluator: &Evaluator<'_>,
) -> Result<Vec<ActionClause>, KernelError> {
    resolve_clause_list(&trigger.actions, ctx, evaluator)
}

/// Flatten a clause list: leaves pass through, conditionals expand to
/// their selected branch's resolution, spliced in place.
fn resolve_clause_list(
    actions: &[ActionClause],
    ctx: &ActionContext,
    evaluator: &Evaluator<'_>,
) -> Result<Vec<ActionClause>, KernelError> {
    let mut resolved = Vec::new();
    for clause in actions {
        if clause.is_conditional() {
            resolved.extend(resolve_clause(clause, ctx, evaluator)?);
        } else {
            resolved.push(clause.clone());
        }
    }
    Ok(resolved)
}

/// Resolve one conditional clause to its flattened actions.
pub fn resolve_clause(
    clause: &ActionClause,
    ctx: &ActionContext,
    evaluator: &Evaluator<'_>,
) -> Result<Vec<ActionClause>, KernelError> {
    match selected_branch(clause, ctx, evaluator)? {
        Some(branch) => resolve_clause_list(branch, ctx, evaluator),
        None => Ok(Vec::new()),
    }
}

/// Pick the branch whose guard passes: `if`, then `elseifs` in
/// declaration order, then `else`. None when nothing passes.
fn selected_branch<'a>(
    clause: &'a ActionClause,
    ctx: &ActionContext,
    evaluator: &Evaluator<'_>,
) -> Result<Option<&'a [ActionClause]>, KernelError> {
    // No if statement means the main action list applies unconditionally.
    let Some(if_) = &clause.if_ else {
        return main_actions(clause).map(Some);
    };
    if evaluator.evaluate(&ctx.eval_context, Some(if_))? {
        return main_actions(clause).map(Some);
    }
    if let Some(elseifs) = &clause.elseifs {
        for elseif in elseifs {
            if evaluator.evaluate(&ctx.eval_context, Some(&elseif.if_))? {
                return Ok(Some(&elseif.actions));
            }
        }
    }
    if let Some(else_) = &clause.else_ {
        return Ok(Some(else_));
    }
    Ok(None)
}

fn main_actions(clause: &ActionClause) -> Result<&[ActionClause], KernelError> {
    clause.actions.as_deref().ok_or_else(|| {
        KernelError::MalformedActionClause(
            "expected conditional clause to carry an action list".to_string(),
        )
    })
}

/// Walk every leaf action and every `if` node in a clause tree, with
/// JSON-path-style locations. Used by validation tooling; the kernel
/// itself resolves rather than walks.
pub fn walk_action_clauses<'a>(
    actions: &'a [ActionClause],
    path: &str,
    on_action: &mut dyn FnMut(&'a ActionClause, &str),
    on_if: &mut dyn FnMut(&'a IfStatement, &str),
) {
    for (i, clause) in actions.iter().enumerate() {
        let clause_path = format!("{path}[{i}]");
        if !clause.is_conditional() {
            on_action(clause, &clause_path);
            continue;
        }
        if let Some(if_) = &clause.if_ {
            on_if(if_, &format!("{clause_path}.if"));
        }
        if let Some(nested) = &clause.actions {
            walk_action_clauses(nested, &format!("{clause_path}.actions"), on_action, on_if);
        }
        if let Some(elseifs) = &clause.elseifs {
            for (j, elseif) in elseifs.iter().enumerate() {
                let elseif_path = format!("{clause_path}.elseifs[{j}]");
                on_if(&elseif.if_, &format!("{elseif_path}.if"));
                walk_action_clauses(
                    &elseif.actions,
                    &format!("{elseif_path}.actions"),
                    on_action,
                    on_if,
                );
            }
        }
        if let Some(else_) = &clause.else_ {
            walk_action_clauses(else_, &format!("{clause_path}.else"), on_action, on_if);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::test_fixtures::action_context_with;
    use serde_json::{json, Value};

    fn resolve(context_values: Value, actions: Value) -> Result<Vec<String>, KernelError> {
        let registry = Registry::with_builtins();
        let evaluator = Evaluator::new(&registry);
        let ctx = action_context_with(json!({}), context_values);
        let trigger: Trigger = serde_json::from_value(json!({
            "name": "t",
            "actions": actions
        }))
        .expect("trigger should deserialize");

        let resolved = actions_for_trigger(&trigger, &ctx, &evaluator)?;
        Ok(resolved
            .into_iter()
            .map(|clause| clause.name.unwrap_or_default())
            .collect())
    }

    #[test]
    fn test_plain_list_passes_through_in_order() {
        let resolved = resolve(
            json!({}),
            json!([
                { "name": "signal_cue", "cue_name": "A" },
                { "name": "signal_cue", "cue_name": "B" }
            ]),
        )
        .expect("should resolve");
        assert_eq!(resolved, vec!["signal_cue", "signal_cue"]);
    }

    #[test]
    fn test_if_selects_main_branch() {
        let resolved = resolve(
            json!({ "flag": true }),
            json!([{
                "name": "conditional",
                "if": { "op": "value_is_true", "ref": "flag" },
                "actions": [{ "name": "set_value", "value_ref": "a", "new_value_ref": "1" }],
                "else": [{ "name": "signal_cue", "cue_name": "X" }]
            }]),
        )
        .expect("should resolve");
        assert_eq!(resolved, vec!["set_value"]);
    }

    #[test]
    fn test_first_passing_elseif_wins() {
        let resolved = resolve(
            json!({ "flag": false, "second": true, "third": true }),
            json!([{
                "name": "conditional",
                "if": { "op": "value_is_true", "ref": "flag" },
                "actions": [{ "name": "set_value", "value_ref": "a", "new_value_ref": "1" }],
                "elseifs": [
                    {
                        "if": { "op": "value_is_true", "ref": "second" },
                        "actions": [{ "name": "signal_cue", "cue_name": "SECOND" }]
                    },
                    {
                        "if": { "op": "value_is_true", "ref": "third" },
                        "actions": [{ "name": "signal_cue", "cue_name": "THIRD" }]
                    }
                ]
            }]),
        )
        .expect("should resolve");
        assert_eq!(resolved, vec!["signal_cue"]);
    }

    #[test]
    fn test_else_when_nothing_passes() {
        let resolved = resolve(
            json!({}),
            json!([{
                "name": "conditional",
                "if": { "op": "value_is_true", "ref": "flag" },
                "actions": [{ "name": "set_value", "value_ref": "a", "new_value_ref": "1" }],
                "else": [{ "name": "signal_cue", "cue_name": "FALLBACK" }]
            }]),
        )
        .expect("should resolve");
        assert_eq!(resolved, vec!["signal_cue"]);
    }

    #[test]
    fn test_no_branch_resolves_empty() {
        let resolved = resolve(
            json!({}),
            json!([{
                "name": "conditional",
                "if": { "op": "value_is_true", "ref": "flag" },
                "actions": [{ "name": "set_value", "value_ref": "a", "new_value_ref": "1" }]
            }]),
        )
        .expect("should resolve");
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_nested_conditionals_flatten_in_declaration_order() {
        let resolved = resolve(
            json!({ "outer": true, "inner": true }),
            json!([
                { "name": "signal_cue", "cue_name": "FIRST" },
                {
                    "name": "conditional",
                    "if": { "op": "value_is_true", "ref": "outer" },
                    "actions": [
                        {
                            "if": { "op": "value_is_true", "ref": "inner" },
                            "actions": [{ "name": "set_value", "value_ref": "a", "new_value_ref": "1" }]
                        },
                        { "name": "signal_cue", "cue_name": "AFTER-NESTED" }
                    ]
                },
                { "name": "signal_cue", "cue_name": "LAST" }
            ]),
        )
        .expect("should resolve");
        assert_eq!(
            resolved,
            vec!["signal_cue", "set_value", "signal_cue", "signal_cue"]
        );
    }

    #[test]
    fn test_selected_branch_without_actions_is_fatal() {
        let err = resolve(
            json!({ "flag": true }),
            json!([{
                "name": "conditional",
                "if": { "op": "value_is_true", "ref": "flag" }
            }]),
        )
        .expect_err("missing action list should fail");
        assert!(matches!(err, KernelError::MalformedActionClause(_)));
    }

    #[test]
    fn test_walker_visits_actions_and_ifs_with_paths() {
        let trigger: Trigger = serde_json::from_value(json!({
            "name": "t",
            "actions": [
                { "name": "signal_cue", "cue_name": "A" },
                {
                    "name": "conditional",
                    "if": { "op": "value_is_true", "ref": "flag" },
                    "actions": [{ "name": "set_value", "value_ref": "a", "new_value_ref": "1" }],
                    "elseifs": [{
                        "if": { "op": "value_is_true", "ref": "other" },
                        "actions": [{ "name": "signal_cue", "cue_name": "B" }]
                    }],
                    "else": [{ "name": "signal_cue", "cue_name": "C" }]
                }
            ]
        }))
        .expect("trigger should deserialize");

        let mut action_paths = Vec::new();
        let mut if_paths = Vec::new();
        walk_action_clauses(
            &trigger.actions,
            "actions",
            &mut |_, path| action_paths.push(path.to_string()),
            &mut |_, path| if_paths.push(path.to_string()),
        );

        assert_eq!(
            action_paths,
            vec![
                "actions[0]",
                "actions[1].actions[0]",
                "actions[1].elseifs[0].actions[0]",
                "actions[1].else[0]"
            ]
        );
        assert_eq!(if_paths, vec!["actions[1].if", "actions[1].elseifs[0].if"]);
    }
}
