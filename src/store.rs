// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence interface for constraint records.
//!
//! Stores are the boundary where records get validated: every implementation must reject
//! constraints which do not pass [`Validate`] on write, so malformed rules never reach the query
//! compiler.
use thiserror::Error;
use tracing::debug;

use crate::constraint::{Constraint, Validate};
use crate::error::ConstraintError;

/// API for reading and administrating constraint records.
pub trait ConstraintStore {
    type Error: std::error::Error;

    /// All constraints in storage order.
    fn list_constraints(&self) -> Result<Vec<Constraint>, Self::Error>;

    fn get_constraint(&self, constraint_id: &str) -> Result<Option<Constraint>, Self::Error>;

    /// Validate and insert a constraint, replacing an existing one with the same id.
    fn put_constraint(&mut self, constraint: Constraint) -> Result<(), Self::Error>;

    /// Remove a constraint. Returns `false` if no constraint with that id existed.
    fn delete_constraint(&mut self, constraint_id: &str) -> Result<bool, Self::Error>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("constraint rejected: {0}")]
    Invalid(#[from] ConstraintError),
}

/// In-memory constraint store keeping records in insertion order.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    constraints: Vec<Constraint>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert all given constraints.
    pub fn from_constraints(
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for constraint in constraints {
            store.put_constraint(constraint)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl ConstraintStore for MemoryStore {
    type Error = StoreError;

    fn list_constraints(&self) -> Result<Vec<Constraint>, Self::Error> {
        Ok(self.constraints.clone())
    }

    fn get_constraint(&self, constraint_id: &str) -> Result<Option<Constraint>, Self::Error> {
        Ok(self
            .constraints
            .iter()
            .find(|constraint| constraint.constraint_id == constraint_id)
            .cloned())
    }

    fn put_constraint(&mut self, constraint: Constraint) -> Result<(), Self::Error> {
        constraint.validate()?;

        match self
            .constraints
            .iter_mut()
            .find(|existing| existing.constraint_id == constraint.constraint_id)
        {
            Some(existing) => {
                debug!(constraint_id = %constraint.constraint_id, "update constraint");
                *existing = constraint;
            }
            None => {
                debug!(constraint_id = %constraint.constraint_id, "insert constraint");
                self.constraints.push(constraint);
            }
        }

        Ok(())
    }

    fn delete_constraint(&mut self, constraint_id: &str) -> Result<bool, Self::Error> {
        let before = self.constraints.len();
        self.constraints
            .retain(|constraint| constraint.constraint_id != constraint_id);

        let removed = self.constraints.len() != before;
        if removed {
            debug!(constraint_id, "delete constraint");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConstraintStore, MemoryStore, StoreError};
    use crate::constraint::{Constraint, Criterion, PermissionTier};
    use crate::error::ConstraintError;
    use crate::operator::Operator;

    fn constraint(id: &str, value: &str) -> Constraint {
        Constraint::new(id, id)
            .with_group_permission("g1", PermissionTier::Read)
            .with_criterion(Criterion::new("labels", Operator::Contains, value))
    }

    #[test]
    fn insert_update_delete() {
        let mut store = MemoryStore::new();
        store.put_constraint(constraint("a", "one")).unwrap();
        store.put_constraint(constraint("b", "two")).unwrap();
        assert_eq!(store.len(), 2);

        // Updating keeps the storage position.
        store.put_constraint(constraint("a", "three")).unwrap();
        let constraints = store.list_constraints().unwrap();
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].constraint_id, "a");
        assert_eq!(constraints[0].criteria[0].value, "three");

        assert!(store.get_constraint("b").unwrap().is_some());
        assert!(store.delete_constraint("b").unwrap());
        assert!(!store.delete_constraint("b").unwrap());
        assert!(store.get_constraint("b").unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalid_constraints_are_rejected_on_write() {
        let mut store = MemoryStore::new();

        let unknown_operator = Constraint::new("a", "a")
            .with_group_permission("g1", PermissionTier::Read)
            .with_criterion(Criterion::new(
                "labels",
                Operator::Unsupported("regex".into()),
                ".*",
            ));
        assert!(matches!(
            store.put_constraint(unknown_operator),
            Err(StoreError::Invalid(ConstraintError::UnknownOperator(_)))
        ));

        let no_criteria =
            Constraint::new("b", "b").with_group_permission("g1", PermissionTier::Read);
        assert!(matches!(
            store.put_constraint(no_criteria),
            Err(StoreError::Invalid(ConstraintError::MissingCriteria(_)))
        ));

        assert!(store.is_empty());
    }

    #[test]
    fn from_constraints_validates_all() {
        let store =
            MemoryStore::from_constraints([constraint("a", "one"), constraint("b", "two")]);
        assert_eq!(store.unwrap().len(), 2);

        let store =
            MemoryStore::from_constraints([constraint("a", "one"), constraint("b", " ")]);
        assert!(store.is_err());
    }
}
