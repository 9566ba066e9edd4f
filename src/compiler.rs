// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compile the criteria of a constraint into a single predicate.
//!
//! All criteria of a constraint are AND-joined. Operators map to clauses as follows:
//!
//! | operator           | rendered form             |
//! |--------------------|---------------------------|
//! | `contains`         | `field:(value)`           |
//! | `does_not_contain` | `-field:(value)`          |
//! | `is_one_of`        | `field:("a" OR "b")`      |
//! | `is_not_one_of`    | `-field:("a" OR "b")`     |
//! | `equals`           | `field:("value")`         |
//! | `starts_with`      | `field:(value*)`          |
//! | `ends_with`        | `field:(*value)`          |
//!
//! A criterion which can not be compiled never widens access: the whole constraint then
//! compiles to [`Predicate::MatchNone`]. This covers unsupported operators, empty values and
//! field names which are not a single plain term.
use tracing::{trace, warn};

use crate::caller::CallerContext;
use crate::constraint::{
    Constraint, Criterion, GroupPermission, PermissionTier, is_valid_field_name,
};
use crate::error::{ConstraintError, UnknownOperatorError};
use crate::operator::Operator;
use crate::predicate::{Clause, Matcher, Predicate};

/// Compiled predicate of one constraint, tagged with the group permissions which made it
/// relevant for the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledPredicate {
    pub constraint_id: String,
    pub permissions: Vec<GroupPermission>,
    pub predicate: Predicate,
}

/// Compile all criteria of a constraint into one conjunction.
///
/// Constraints without criteria compile to the empty predicate.
pub fn compile(constraint: &Constraint) -> Predicate {
    let mut clauses = Vec::with_capacity(constraint.criteria.len());

    for criterion in &constraint.criteria {
        match compile_criterion(criterion) {
            Ok(clause) => clauses.push(Predicate::Clause(clause)),
            Err(err) => {
                warn!(
                    constraint_id = %constraint.constraint_id,
                    field = %criterion.field,
                    "criterion can not be compiled, constraint matches nothing: {err}"
                );
                return Predicate::MatchNone;
            }
        }
    }

    Predicate::and(clauses)
}

/// Compile a constraint and render it to query-string syntax.
pub fn compile_to_string(constraint: &Constraint) -> String {
    compile(constraint).to_string()
}

/// Compile a constraint for a caller.
///
/// Returns `None` when none of the caller's groups holds a permission on the constraint, or,
/// when a tier is given, none holds that tier.
pub fn compile_for(
    constraint: &Constraint,
    caller: &CallerContext,
    tier: Option<PermissionTier>,
) -> Option<CompiledPredicate> {
    let permissions: Vec<GroupPermission> = constraint
        .permissions_for(caller)
        .filter(|permission| tier.is_none_or(|tier| permission.permission == tier))
        .cloned()
        .collect();

    if permissions.is_empty() {
        return None;
    }

    let predicate = compile(constraint);
    trace!(
        constraint_id = %constraint.constraint_id,
        predicate = %predicate,
        "compiled constraint"
    );

    Some(CompiledPredicate {
        constraint_id: constraint.constraint_id.clone(),
        permissions,
        predicate,
    })
}

/// Compile a single criterion into a field clause.
pub fn compile_criterion(criterion: &Criterion) -> Result<Clause, ConstraintError> {
    if !is_valid_field_name(&criterion.field) {
        return Err(ConstraintError::InvalidFieldName(criterion.field.clone()));
    }

    let empty_value = || ConstraintError::EmptyValue(criterion.field.clone());

    let matcher = match &criterion.operator {
        Operator::Contains | Operator::DoesNotContain => {
            if criterion.value.trim().is_empty() {
                return Err(empty_value());
            }
            Matcher::Text(criterion.value.clone())
        }
        Operator::IsOneOf | Operator::IsNotOneOf => {
            let values = criterion.values();
            if values.is_empty() {
                return Err(empty_value());
            }
            Matcher::AnyOf(values.into_iter().map(str::to_owned).collect())
        }
        Operator::Equals => Matcher::Phrase(non_empty(criterion).ok_or_else(empty_value)?),
        Operator::StartsWith => Matcher::Prefix(non_empty(criterion).ok_or_else(empty_value)?),
        Operator::EndsWith => Matcher::Suffix(non_empty(criterion).ok_or_else(empty_value)?),
        Operator::Unsupported(name) => {
            return Err(UnknownOperatorError(name.clone()).into());
        }
    };

    let clause = Clause::new(criterion.field.clone(), matcher);
    if criterion.operator.is_negated() {
        Ok(clause.negate())
    } else {
        Ok(clause)
    }
}

fn non_empty(criterion: &Criterion) -> Option<String> {
    let value = criterion.value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}
