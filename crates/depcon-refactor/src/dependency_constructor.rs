//! Dependency constructor synthesis.
//!
//! Every read-only field of a class is treated as a dependency that should be
//! passed into the (first) constructor and assigned there. Fields are matched
//! to parameters purely by name, see [`derive_parameter_name`].

use std::collections::{BTreeMap, HashSet};

use depcon_syntax::{Body, ClassNode, ConstructorMember, Member, Parameter, Statement, TypeRef};
use serde::Serialize;

use crate::CancellationToken;

/// Modifier given to constructors created from scratch.
pub const GENERATED_CONSTRUCTOR_MODIFIER: &str = "public";

/// A read-only field together with the constructor parameter it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyCandidate {
    pub field_type: TypeRef,
    pub field_name: String,
    pub parameter_name: String,
}

/// `_foo` → `foo`, `foo` → `_foo`.
///
/// The verbatim `@` prefix is not part of the name (`@class` → `_class`).
/// Only a single leading underscore is stripped. No collision resolution
/// happens here; see [`parameter_name_collisions`].
pub fn derive_parameter_name(field_name: &str) -> String {
    let field_name = field_name.strip_prefix('@').unwrap_or(field_name);
    match field_name.strip_prefix('_') {
        Some(rest) => rest.to_string(),
        None => format!("_{field_name}"),
    }
}

/// Candidates for every variable of every read-only field, in declaration order.
pub fn dependency_candidates(class: &ClassNode) -> Vec<DependencyCandidate> {
    class
        .fields()
        .filter(|field| field.is_readonly())
        .flat_map(|field| {
            field.variables.iter().map(|var| DependencyCandidate {
                field_type: field.ty.clone(),
                field_name: var.name.clone(),
                parameter_name: derive_parameter_name(&var.name),
            })
        })
        .collect()
}

/// What the engine would add to a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorPlan {
    /// Index of the constructor to extend; `None` when a new one is appended.
    pub constructor_index: Option<usize>,
    pub missing_parameters: Vec<Parameter>,
    pub missing_assignments: Vec<Statement>,
}

/// Computes the missing parameters and assignments of `class`.
///
/// Returns `None` when there is nothing to do, which is also the case when the
/// first constructor has no block body to append statements to.
pub fn plan_constructor(class: &ClassNode) -> Option<ConstructorPlan> {
    let candidates = dependency_candidates(class);
    let current = class.first_constructor();

    if let Some((_, ctor)) = current {
        if !matches!(ctor.body, Body::Block(_)) {
            tracing::debug!(
                target = "depcon.refactor",
                class = %class.name,
                "first constructor has no block body; nothing to extend"
            );
            return None;
        }
    }

    let existing_parameter_names: HashSet<&str> = current
        .map(|(_, ctor)| ctor.parameters.iter().map(|p| p.name.as_str()).collect())
        .unwrap_or_default();
    let field_names: HashSet<&str> = candidates.iter().map(|c| c.field_name.as_str()).collect();
    let assigned_field_names: HashSet<&str> = current
        .map(|(_, ctor)| {
            ctor.body
                .statements()
                .iter()
                .filter_map(Statement::assigned_name)
                .filter(|name| field_names.contains(name))
                .collect()
        })
        .unwrap_or_default();

    let missing_parameters: Vec<Parameter> = candidates
        .iter()
        .filter(|c| !existing_parameter_names.contains(c.parameter_name.as_str()))
        .map(|c| Parameter::new(c.field_type.clone(), c.parameter_name.clone()))
        .collect();
    let missing_assignments: Vec<Statement> = candidates
        .iter()
        .filter(|c| !assigned_field_names.contains(c.field_name.as_str()))
        .map(|c| Statement::assignment(c.field_name.clone(), c.parameter_name.clone()))
        .collect();

    if missing_parameters.is_empty() && missing_assignments.is_empty() {
        return None;
    }

    Some(ConstructorPlan {
        constructor_index: current.map(|(idx, _)| idx),
        missing_parameters,
        missing_assignments,
    })
}

/// Returns a copy of `class` whose first constructor (created if absent)
/// takes a parameter for, and assigns, every read-only field.
///
/// Idempotent. A cancelled token returns the input unchanged.
pub fn synthesize_dependency_constructor(class: &ClassNode, cancel: &CancellationToken) -> ClassNode {
    if cancel.is_cancelled() {
        tracing::debug!(target = "depcon.refactor", class = %class.name, "cancelled before synthesis");
        return class.clone();
    }

    let Some(plan) = plan_constructor(class) else {
        return class.clone();
    };

    for group in parameter_name_collisions(&dependency_candidates(class)) {
        tracing::warn!(
            target = "depcon.refactor",
            class = %class.name,
            parameter = %group.parameter_name,
            fields = ?group.field_names,
            "several read-only fields map to the same constructor parameter"
        );
    }

    tracing::debug!(
        target = "depcon.refactor",
        class = %class.name,
        new_constructor = plan.constructor_index.is_none(),
        parameters = plan.missing_parameters.len(),
        assignments = plan.missing_assignments.len(),
        "synthesizing dependency constructor"
    );

    let mut out = class.clone();
    match plan.constructor_index {
        None => out.members.push(Member::Constructor(ConstructorMember {
            name: class.name.clone(),
            modifiers: vec![GENERATED_CONSTRUCTOR_MODIFIER.to_string()],
            parameters: plan.missing_parameters,
            initializer: None,
            body: Body::Block(plan.missing_assignments),
        })),
        Some(idx) => {
            if let Some(Member::Constructor(ctor)) = out.members.get_mut(idx) {
                ctor.parameters.extend(plan.missing_parameters);
                if let Body::Block(statements) = &mut ctor.body {
                    statements.extend(plan.missing_assignments);
                }
            }
        }
    }
    out
}

/// `true` iff [`synthesize_dependency_constructor`] would change `class`.
///
/// A cancelled token returns `false`.
pub fn is_dependency_constructor_applicable(class: &ClassNode, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    plan_constructor(class).is_some()
}

/// Read-only fields that derive the same parameter name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    pub parameter_name: String,
    pub field_names: Vec<String>,
}

/// Groups candidates whose parameter names collide (`__a` and `a` both map to
/// `_a`). The engine does not resolve these; a duplicate parameter is emitted.
pub fn parameter_name_collisions(candidates: &[DependencyCandidate]) -> Vec<NameCollision> {
    let mut by_parameter: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for candidate in candidates {
        by_parameter
            .entry(candidate.parameter_name.as_str())
            .or_default()
            .push(candidate.field_name.clone());
    }
    by_parameter
        .into_iter()
        .filter(|(_, fields)| fields.len() > 1)
        .map(|(parameter_name, field_names)| NameCollision {
            parameter_name: parameter_name.to_string(),
            field_names,
        })
        .collect()
}

/// A summary of a class's dependency state, used by batch checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyAnalysis {
    pub class_name: String,
    pub candidates: Vec<DependencyCandidate>,
    pub has_constructor: bool,
    /// Parameter names the constructor lacks.
    pub missing_parameters: Vec<String>,
    /// Field names the constructor does not assign.
    pub unassigned_fields: Vec<String>,
    pub collisions: Vec<NameCollision>,
}

impl DependencyAnalysis {
    pub fn is_applicable(&self) -> bool {
        !self.missing_parameters.is_empty() || !self.unassigned_fields.is_empty()
    }
}

pub fn analyze_dependencies(class: &ClassNode) -> DependencyAnalysis {
    let candidates = dependency_candidates(class);
    let plan = plan_constructor(class);
    let (missing_parameters, unassigned_fields) = match &plan {
        Some(plan) => (
            plan.missing_parameters.iter().map(|p| p.name.clone()).collect(),
            plan.missing_assignments
                .iter()
                .filter_map(Statement::assigned_name)
                .map(str::to_string)
                .collect(),
        ),
        None => (Vec::new(), Vec::new()),
    };
    DependencyAnalysis {
        class_name: class.name.clone(),
        collisions: parameter_name_collisions(&candidates),
        candidates,
        has_constructor: class.first_constructor().is_some(),
        missing_parameters,
        unassigned_fields,
    }
}
