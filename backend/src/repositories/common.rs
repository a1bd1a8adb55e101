//! Shared repository utilities.

use sqlx::{Postgres, QueryBuilder};

/// Appends WHERE or AND to the query builder depending on whether a clause has already been added.
pub fn push_clause(builder: &mut QueryBuilder<'_, Postgres>, has_clause: &mut bool) {
    if *has_clause {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_clause = true;
    }
}

/// Starts a tenant-scoped `SELECT` with the organization filter already applied.
pub fn tenant_select<'a>(
    columns: &str,
    table: &str,
    organization_id: crate::types::OrganizationId,
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM {}", columns, table));
    builder.push(" WHERE organization_id = ");
    builder.push_bind(organization_id);
    builder
}

/// Escapes `%`, `_` and `\` for use inside an `ILIKE` pattern.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
