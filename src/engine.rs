// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing::debug;

use crate::caller::CallerContext;
use crate::constraint::PermissionTier;
use crate::matcher::matching;
use crate::query::{
    AggregationDocument, QueryDocument, build_filter_query, build_permission_aggregation,
    build_tier_filter_query,
};
use crate::store::ConstraintStore;

/// Builds search documents for a caller from the constraints held in a store.
///
/// Every call reads the current constraint list once; nothing is cached between requests.
#[derive(Clone, Debug)]
pub struct ConstraintQueries<S> {
    store: S,
}

impl<S> ConstraintQueries<S>
where
    S: ConstraintStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access for administrative writes.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Filter query restricting search results to what the caller may see.
    pub fn filter_query(&self, caller: &CallerContext) -> Result<QueryDocument, S::Error> {
        let constraints = self.store.list_constraints()?;
        let matched = matching(&constraints, caller);
        debug!(matched = matched.len(), "build filter query");
        Ok(build_filter_query(&matched, caller))
    }

    /// Filter query restricted to constraints on which the caller holds the given tier.
    pub fn tier_filter_query(
        &self,
        caller: &CallerContext,
        tier: PermissionTier,
    ) -> Result<QueryDocument, S::Error> {
        let constraints = self.store.list_constraints()?;
        let matched = matching(&constraints, caller);
        debug!(matched = matched.len(), %tier, "build tier filter query");
        Ok(build_tier_filter_query(&matched, caller, tier))
    }

    /// Aggregation counting results per permission tier the caller holds.
    pub fn permission_aggregation(
        &self,
        caller: &CallerContext,
    ) -> Result<AggregationDocument, S::Error> {
        let constraints = self.store.list_constraints()?;
        let matched = matching(&constraints, caller);
        debug!(matched = matched.len(), "build permission aggregation");
        Ok(build_permission_aggregation(&matched, caller))
    }
}
