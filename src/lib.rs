// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compile group-based, field-level access constraints into search queries.
//!
//! A [`Constraint`] grants a permission tier (`Read`, `Edit` or `Admin`) to a set of groups on
//! all resources matching its criteria. Per request the constraints relevant to the caller's
//! groups are selected, their criteria are compiled into boolean predicates and assembled into:
//!
//! - a filter query restricting which resources the caller may see, and
//! - a filters aggregation counting results per permission tier.
//!
//! Within a constraint all criteria are AND-joined, across constraints predicates are OR-joined.
//! Whenever nothing contributes to a filter the result is an explicit `match_none` query. A
//! criterion which can not be compiled makes its constraint match nothing instead of being
//! ignored.
//!
//! ```rust
//! use access_constraints::{
//!     CallerContext, Constraint, Criterion, Operator, PermissionTier, build_filter_query,
//!     matching,
//! };
//!
//! let constraints = vec![
//!     Constraint::new("c1", "cad files")
//!         .with_group_permission("engineers", PermissionTier::Read)
//!         .with_criterion(Criterion::new("type", Operator::IsOneOf, "cad, bim")),
//! ];
//!
//! let caller = CallerContext::new(["engineers"]);
//! let matched = matching(&constraints, &caller);
//! let document = build_filter_query(&matched, &caller);
//!
//! assert_eq!(
//!     document.query.query_string(),
//!     Some(r#"(type:("cad" OR "bim"))"#)
//! );
//! ```
mod cache;
mod caller;
mod compiler;
mod constraint;
mod engine;
mod error;
mod matcher;
mod operator;
pub mod predicate;
mod query;
mod store;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use cache::{Config as MfaCacheConfig, MfaDecisionCache};
pub use caller::{CallerContext, Claims, GroupId};
pub use compiler::{CompiledPredicate, compile, compile_criterion, compile_for, compile_to_string};
pub use constraint::{
    Constraint, Criterion, GroupPermission, MAX_LENGTH, PermissionTier, Validate,
    is_valid_field_name, is_valid_name,
};
pub use engine::ConstraintQueries;
pub use error::{ConstraintError, UnknownOperatorError};
pub use matcher::matching;
pub use operator::Operator;
pub use query::{
    AggregationDocument, Aggregations, FiltersAggregation, MatchNone, Query, QueryDocument,
    QueryString, TierFilters, build_filter_query, build_permission_aggregation,
    build_tier_filter_query,
};
pub use store::{ConstraintStore, MemoryStore, StoreError};
