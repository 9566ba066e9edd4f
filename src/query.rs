// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assemble compiled constraints into search filter and permission aggregation documents.
//!
//! Predicates of all constraints relevant to the caller are OR-joined into one query-string
//! filter. When nothing contributes to the filter an explicit `match_none` query is produced, so
//! "no rules apply" always means deny and never "allow everything".
//!
//! The aggregation document buckets the same predicates by the permission tier the caller holds
//! on each constraint, to count results per tier without revealing unauthorized items.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::caller::CallerContext;
use crate::compiler::compile_for;
use crate::constraint::{Constraint, PermissionTier};
use crate::predicate::Predicate;

/// Query clause understood by the search backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    QueryString(QueryString),
    MatchNone(MatchNone),
}

impl Query {
    pub fn query_string(&self) -> Option<&str> {
        match self {
            Query::QueryString(query_string) => Some(&query_string.query),
            Query::MatchNone(_) => None,
        }
    }

    pub fn is_match_none(&self) -> bool {
        matches!(self, Query::MatchNone(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryString {
    pub query: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchNone {}

/// Top-level filter query restricting the resources visible to a caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDocument {
    pub query: Query,
}

impl QueryDocument {
    pub fn query_string(query: impl Into<String>) -> Self {
        Self {
            query: Query::QueryString(QueryString {
                query: query.into(),
            }),
        }
    }

    /// Deny-by-default document.
    pub fn match_none() -> Self {
        Self {
            query: Query::MatchNone(MatchNone::default()),
        }
    }

    pub fn is_match_none(&self) -> bool {
        self.query.is_match_none()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Filters aggregation with one named sub-query per permission tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiltersAggregation {
    pub filters: TierFilters,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierFilters {
    /// Keyed by tier, serialized in tier order.
    pub filters: BTreeMap<PermissionTier, Query>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregations {
    pub permissions: FiltersAggregation,
}

/// Aggregation query counting search results per permission tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationDocument {
    pub aggs: Aggregations,
}

impl AggregationDocument {
    pub fn buckets(&self) -> &BTreeMap<PermissionTier, Query> {
        &self.aggs.permissions.filters.filters
    }

    /// Query string registered for a tier, if the tier has a bucket.
    pub fn bucket(&self, tier: PermissionTier) -> Option<&str> {
        self.buckets().get(&tier).and_then(Query::query_string)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Build the filter query over all permission tiers the caller holds.
pub fn build_filter_query(matched: &[&Constraint], caller: &CallerContext) -> QueryDocument {
    assemble(matched, caller, None)
}

/// Build the filter query only from constraints on which the caller holds the given tier.
pub fn build_tier_filter_query(
    matched: &[&Constraint],
    caller: &CallerContext,
    tier: PermissionTier,
) -> QueryDocument {
    assemble(matched, caller, Some(tier))
}

/// Build the per-tier aggregation. Tiers without any contributing constraint are left out.
pub fn build_permission_aggregation(
    matched: &[&Constraint],
    caller: &CallerContext,
) -> AggregationDocument {
    let mut document = AggregationDocument::default();

    for tier in PermissionTier::ALL {
        let filter = build_tier_filter_query(matched, caller, tier);
        if filter.is_match_none() {
            continue;
        }

        document
            .aggs
            .permissions
            .filters
            .filters
            .insert(tier, filter.query);
    }

    debug!(
        tiers = document.buckets().len(),
        "assembled permission aggregation"
    );

    document
}

fn assemble(
    matched: &[&Constraint],
    caller: &CallerContext,
    tier: Option<PermissionTier>,
) -> QueryDocument {
    let predicates = matched
        .iter()
        .filter_map(|constraint| compile_for(constraint, caller, tier))
        .map(|compiled| compiled.predicate)
        .collect();

    let filter = Predicate::or(predicates);
    if filter.is_empty() {
        debug!(?tier, "no constraint contributes to filter, matching nothing");
        return QueryDocument::match_none();
    }

    QueryDocument::query_string(filter.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        AggregationDocument, QueryDocument, build_filter_query, build_permission_aggregation,
        build_tier_filter_query,
    };
    use crate::caller::CallerContext;
    use crate::constraint::{Constraint, Criterion, PermissionTier};
    use crate::operator::Operator;

    fn constraint(id: &str, group: &str, tier: PermissionTier, field: &str) -> Constraint {
        Constraint::new(id, id)
            .with_group_permission(group, tier)
            .with_criterion(Criterion::new(field, Operator::Contains, id))
    }

    #[test]
    fn or_join_in_input_order() {
        let a = constraint("a", "g1", PermissionTier::Read, "f1");
        let b = constraint("b", "g1", PermissionTier::Edit, "f2");
        let caller = CallerContext::new(["g1"]);

        let document = build_filter_query(&[&a, &b], &caller);
        assert_eq!(document.query.query_string(), Some("(f1:(a)) OR (f2:(b))"));

        let document = build_filter_query(&[&b, &a], &caller);
        assert_eq!(document.query.query_string(), Some("(f2:(b)) OR (f1:(a))"));
    }

    #[test]
    fn filter_document_shape() {
        let a = constraint("a", "g1", PermissionTier::Read, "type");
        let caller = CallerContext::new(["g1"]);

        let document = build_filter_query(&[&a], &caller);
        assert_eq!(
            document.to_json_value().unwrap(),
            json!({ "query": { "query_string": { "query": "(type:(a))" } } })
        );
    }

    #[test]
    fn nothing_matched_denies() {
        let caller = CallerContext::new(["g1"]);
        let document = build_filter_query(&[], &caller);

        assert!(document.is_match_none());
        assert_eq!(document, QueryDocument::match_none());
        assert_eq!(
            document.to_json().unwrap(),
            r#"{"query":{"match_none":{}}}"#
        );
    }

    #[test]
    fn empty_predicates_deny() {
        let empty =
            Constraint::new("empty", "empty").with_group_permission("g1", PermissionTier::Read);
        let caller = CallerContext::new(["g1"]);

        assert!(build_filter_query(&[&empty, &empty], &caller).is_match_none());
    }

    #[test]
    fn empty_and_failing_constraints_are_dropped() {
        let empty =
            Constraint::new("empty", "empty").with_group_permission("g1", PermissionTier::Read);
        let broken = Constraint::new("broken", "broken")
            .with_group_permission("g1", PermissionTier::Read)
            .with_criterion(Criterion::new(
                "type",
                Operator::Unsupported("regex".into()),
                ".*",
            ));
        let a = constraint("a", "g1", PermissionTier::Read, "type");
        let caller = CallerContext::new(["g1"]);

        let document = build_filter_query(&[&empty, &broken, &a], &caller);
        assert_eq!(document.query.query_string(), Some("(type:(a))"));

        assert!(build_filter_query(&[&broken], &caller).is_match_none());
    }

    #[test]
    fn tier_filter_only_uses_held_tier() {
        let a = constraint("a", "g1", PermissionTier::Read, "f1");
        let b = constraint("b", "g2", PermissionTier::Edit, "f2");
        let caller = CallerContext::new(["g1", "g2"]);

        let read = build_tier_filter_query(&[&a, &b], &caller, PermissionTier::Read);
        assert_eq!(read.query.query_string(), Some("(f1:(a))"));

        let admin = build_tier_filter_query(&[&a, &b], &caller, PermissionTier::Admin);
        assert!(admin.is_match_none());
    }

    #[test]
    fn aggregation_buckets_by_held_tier() {
        // g1 holds Read on A and Edit on B, only g2 (not held by the caller) holds Admin on C.
        let a = constraint("a", "g1", PermissionTier::Read, "f1");
        let b = constraint("b", "g1", PermissionTier::Edit, "f2");
        let c = constraint("c", "g2", PermissionTier::Admin, "f3");
        let caller = CallerContext::new(["g1"]);

        let document = build_permission_aggregation(&[&a, &b, &c], &caller);
        assert_eq!(document.buckets().len(), 2);
        assert_eq!(document.bucket(PermissionTier::Read), Some("(f1:(a))"));
        assert_eq!(document.bucket(PermissionTier::Edit), Some("(f2:(b))"));
        assert_eq!(document.bucket(PermissionTier::Admin), None);

        assert_eq!(
            document.to_json().unwrap(),
            r#"{"aggs":{"permissions":{"filters":{"filters":{"Read":{"query_string":{"query":"(f1:(a))"}},"Edit":{"query_string":{"query":"(f2:(b))"}}}}}}}"#
        );
    }

    #[test]
    fn constraint_lands_in_every_held_tier() {
        // Legacy record with two groups of the caller holding different tiers.
        let shared = Constraint::new("s", "shared")
            .with_group_permission("g1", PermissionTier::Read)
            .with_group_permission("g2", PermissionTier::Admin)
            .with_criterion(Criterion::new("labels", Operator::Contains, "shared"));
        let caller = CallerContext::new(["g1", "g2"]);

        let document = build_permission_aggregation(&[&shared], &caller);
        assert_eq!(document.bucket(PermissionTier::Read), Some("(labels:(shared))"));
        assert_eq!(document.bucket(PermissionTier::Edit), None);
        assert_eq!(document.bucket(PermissionTier::Admin), Some("(labels:(shared))"));
    }

    #[test]
    fn aggregation_without_buckets() {
        let caller = CallerContext::new(["g1"]);
        let document = build_permission_aggregation(&[], &caller);

        assert_eq!(document, AggregationDocument::default());
        assert_eq!(
            document.to_json().unwrap(),
            r#"{"aggs":{"permissions":{"filters":{"filters":{}}}}}"#
        );
    }

    #[test]
    fn documents_are_deterministic() {
        let a = constraint("a", "g1", PermissionTier::Read, "f1");
        let b = constraint("b", "g2", PermissionTier::Edit, "f2");
        let caller = CallerContext::new(["g1", "g2"]);

        let first = build_permission_aggregation(&[&a, &b], &caller).to_json().unwrap();
        let second = build_permission_aggregation(&[&a, &b], &caller).to_json().unwrap();
        assert_eq!(first, second);

        let first = build_filter_query(&[&a, &b], &caller).to_json().unwrap();
        let second = build_filter_query(&[&a, &b], &caller).to_json().unwrap();
        assert_eq!(first, second);
    }
}
