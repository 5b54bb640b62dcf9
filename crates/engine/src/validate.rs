//! Workflow template validation — run this before seeding a template.
//!
//! Rules enforced, in order:
//! 1. `slug` and `name` are non-empty.
//! 2. At least one step is present.
//! 3. Step temp ids are non-empty and unique.
//! 4. Exactly one step has type `start`.
//! 5. Group temp ids are non-empty, unique, and never equal a step temp id.
//! 6. Every edge source resolves to a declared step or group.
//! 7. Every edge target resolves likewise.
//! 8. A step's `block_group_temp_id` names a declared group.
//!
//! [`validate_template`] stops at the first violation; [`template_violations`]
//! collects all of them in the same order.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::models::{EdgeEndpoint, WorkflowTemplate, START_STEP_TYPE};

/// Check `template` and return the first violation, if any.
pub fn validate_template(template: &WorkflowTemplate) -> Result<(), ValidationError> {
    match template_violations(template).into_iter().next() {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}

/// Every structural violation in `template`, in rule order.
pub fn template_violations(template: &WorkflowTemplate) -> Vec<ValidationError> {
    let mut violations = Vec::new();

    // -----------------------------------------------------------------------
    // 1. Identity
    // -----------------------------------------------------------------------
    if template.slug.trim().is_empty() {
        violations.push(ValidationError::new("slug", "must not be empty"));
    }
    if template.name.trim().is_empty() {
        violations.push(ValidationError::new("name", "must not be empty"));
    }

    // -----------------------------------------------------------------------
    // 2–4. Steps
    // -----------------------------------------------------------------------
    if template.steps.is_empty() {
        violations.push(ValidationError::new(
            "steps",
            "template must contain at least one step",
        ));
    }

    let mut step_ids: HashSet<&str> = HashSet::with_capacity(template.steps.len());
    for (i, step) in template.steps.iter().enumerate() {
        if step.temp_id.is_empty() {
            violations.push(ValidationError::new(
                format!("steps[{i}].temp_id"),
                "must not be empty",
            ));
        } else if !step_ids.insert(step.temp_id.as_str()) {
            violations.push(ValidationError::new(
                format!("steps[{i}].temp_id"),
                format!("duplicate step temp_id '{}'", step.temp_id),
            ));
        }
    }

    if !template.steps.is_empty() {
        let starts = template.steps.iter().filter(|s| s.is_start()).count();
        if starts != 1 {
            violations.push(ValidationError::new(
                "steps",
                format!("exactly one step must have type '{START_STEP_TYPE}', found {starts}"),
            ));
        }
    }

    // -----------------------------------------------------------------------
    // 5. Groups
    // -----------------------------------------------------------------------
    let mut group_ids: HashSet<&str> = HashSet::with_capacity(template.block_groups.len());
    for (i, group) in template.block_groups.iter().enumerate() {
        let field = format!("block_groups[{i}].temp_id");
        if group.temp_id.is_empty() {
            violations.push(ValidationError::new(field, "must not be empty"));
        } else if step_ids.contains(group.temp_id.as_str()) {
            violations.push(ValidationError::new(
                field,
                format!("group temp_id '{}' collides with a step temp_id", group.temp_id),
            ));
        } else if !group_ids.insert(group.temp_id.as_str()) {
            violations.push(ValidationError::new(
                field,
                format!("duplicate group temp_id '{}'", group.temp_id),
            ));
        }
    }

    // -----------------------------------------------------------------------
    // 6–7. Edge endpoints
    // -----------------------------------------------------------------------
    let endpoint_violation = |i: usize, side: &str, endpoint: &EdgeEndpoint| match endpoint {
        EdgeEndpoint::StepRef(id) if !step_ids.contains(id.as_str()) => Some(ValidationError::new(
            format!("edges[{i}].{side}_temp_id"),
            format!("'{id}' does not match any declared step"),
        )),
        EdgeEndpoint::GroupRef(id) if !group_ids.contains(id.as_str()) => {
            Some(ValidationError::new(
                format!("edges[{i}].{side}_group_temp_id"),
                format!("'{id}' does not match any declared block group"),
            ))
        }
        _ => None,
    };

    for (i, edge) in template.edges.iter().enumerate() {
        violations.extend(endpoint_violation(i, "source", &edge.source));
    }
    for (i, edge) in template.edges.iter().enumerate() {
        violations.extend(endpoint_violation(i, "target", &edge.target));
    }

    // -----------------------------------------------------------------------
    // 8. Containment
    // -----------------------------------------------------------------------
    for (i, step) in template.steps.iter().enumerate() {
        if let Some(group) = step.block_group_temp_id.as_deref() {
            if !group_ids.contains(group) {
                violations.push(ValidationError::new(
                    format!("steps[{i}].block_group_temp_id"),
                    format!("'{group}' does not match any declared block group"),
                ));
            }
        }
    }

    violations
}
