// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.
use crate::constraint::{Constraint, Criterion, PermissionTier};
use crate::operator::Operator;

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

/// Constraint granting one tier to one group, with a single criterion.
pub fn single_criterion_constraint(
    constraint_id: &str,
    group_id: &str,
    tier: PermissionTier,
    criterion: Criterion,
) -> Constraint {
    Constraint::new(constraint_id, constraint_id)
        .with_description(format!("{tier} access for {group_id}"))
        .with_group_permission(group_id, tier)
        .with_criterion(criterion)
}

/// Set of constraints covering all operators and tiers, spread over four groups:
///
/// | id          | group       | tier  | criterion                                  |
/// |-------------|-------------|-------|--------------------------------------------|
/// | `labels`    | `all-users` | Admin | `labels` contains `top-secret`             |
/// | `f2-one-of` | `reviewers` | Edit  | `f2` is one of `restricted`                |
/// | `f1-secret` | `engineers` | Edit  | `f1` contains `secret`                     |
/// | `not-this`  | `engineers` | Edit  | `labels` is not one of `not this one`      |
/// | `f1-public` | `engineers` | Read  | `f1` is not one of `restricted`            |
/// | `cad`       | `designers` | Read  | `type` is one of `cad, bim`                |
pub fn sample_constraints() -> Vec<Constraint> {
    vec![
        single_criterion_constraint(
            "labels",
            "all-users",
            PermissionTier::Admin,
            Criterion::new("labels", Operator::Contains, "top-secret"),
        ),
        single_criterion_constraint(
            "f2-one-of",
            "reviewers",
            PermissionTier::Edit,
            Criterion::new("f2", Operator::IsOneOf, "restricted"),
        ),
        single_criterion_constraint(
            "f1-secret",
            "engineers",
            PermissionTier::Edit,
            Criterion::new("f1", Operator::Contains, "secret"),
        ),
        single_criterion_constraint(
            "not-this",
            "engineers",
            PermissionTier::Edit,
            Criterion::new("labels", Operator::IsNotOneOf, "not this one"),
        ),
        single_criterion_constraint(
            "f1-public",
            "engineers",
            PermissionTier::Read,
            Criterion::new("f1", Operator::IsNotOneOf, "restricted"),
        ),
        single_criterion_constraint(
            "cad",
            "designers",
            PermissionTier::Read,
            Criterion::new("type", Operator::IsOneOf, "cad, bim"),
        ),
    ]
}
