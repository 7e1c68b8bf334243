use std::marker::PhantomData;

use sea_orm::sea_query::{ConditionalStatement, Expr, Query, UpdateStatement};
use sea_orm::{DatabaseBackend, EntityName, EntityTrait, Statement, Value};

use crate::errors::ServiceError;

/// Builds a partial UPDATE statement from a sparse set of fields.
///
/// Assignments accumulate as structured statement state and only serialise to
/// SQL (with positionally bound parameters) when `build` is called, so
/// parameter indices can never drift from the clause list. Building with zero
/// assignments is a caller error, not an empty statement.
pub struct UpdateBuilder<E: EntityTrait> {
    stmt: UpdateStatement,
    assignments: usize,
    entity: PhantomData<E>,
}

impl<E: EntityTrait> UpdateBuilder<E> {
    pub fn new() -> Self {
        let mut stmt = Query::update();
        stmt.table(E::default().table_ref());
        Self {
            stmt,
            assignments: 0,
            entity: PhantomData,
        }
    }

    /// Adds a `column = value` assignment.
    pub fn set<V>(mut self, column: E::Column, value: V) -> Self
    where
        V: Into<Value>,
    {
        self.stmt.value(column, value.into());
        self.assignments += 1;
        self
    }

    /// True when no field has been supplied yet.
    pub fn is_empty(&self) -> bool {
        self.assignments == 0
    }

    /// Scopes the update to a single record and serialises the statement for
    /// the given backend.
    pub fn build(
        mut self,
        backend: DatabaseBackend,
        key: E::Column,
        id: i64,
    ) -> Result<Statement, ServiceError> {
        if self.assignments == 0 {
            return Err(ServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }

        self.stmt.and_where(Expr::col(key).eq(id));
        Ok(backend.build(&self.stmt))
    }
}

impl<E: EntityTrait> Default for UpdateBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}
