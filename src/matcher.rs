// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing::trace;

use crate::caller::CallerContext;
use crate::constraint::Constraint;

/// Select the constraints on which at least one of the caller's groups holds a permission.
///
/// Storage order is kept. A caller without groups matches no constraint.
pub fn matching<'a>(constraints: &'a [Constraint], caller: &CallerContext) -> Vec<&'a Constraint> {
    if caller.is_empty() {
        return Vec::new();
    }

    let matched: Vec<&Constraint> = constraints
        .iter()
        .filter(|constraint| constraint.is_relevant_to(caller))
        .collect();

    trace!(
        total = constraints.len(),
        matched = matched.len(),
        "matched constraints for caller groups"
    );

    matched
}
