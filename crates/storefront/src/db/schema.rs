//! Schema store: versioned migrations plus additive column evolution.
//!
//! Databases created by the first deployment lack `shop.comment.user_id`. The
//! evolution step checks `information_schema` for every entry in
//! [`OPTIONAL_COLUMNS`] and adds whatever is missing. Columns are only ever
//! added, never dropped or retyped, and every step is safe to run again.

use serde::Serialize;
use sqlx::PgPool;
use sqlx::migrate::Migrator;

use super::RepositoryError;

/// Embedded migrations from `crates/storefront/migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// A column that may be missing from databases created by older deployments.
#[derive(Debug, Clone, Copy)]
pub struct OptionalColumn {
    /// Schema of the table.
    pub schema: &'static str,
    /// Table name.
    pub table: &'static str,
    /// Column name.
    pub column: &'static str,
    /// Column type and constraints for `ADD COLUMN`.
    pub definition: &'static str,
}

impl OptionalColumn {
    fn qualified(&self) -> String {
        format!("{}.{}.{}", self.schema, self.table, self.column)
    }
}

/// Columns added after the first deployment.
pub const OPTIONAL_COLUMNS: &[OptionalColumn] = &[OptionalColumn {
    schema: "shop",
    table: "comment",
    column: "user_id",
    definition: "INTEGER REFERENCES shop.customer (id) ON DELETE SET NULL",
}];

/// Outcome of a schema evolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    /// Number of migrations applied by this run.
    pub migrations_applied: usize,
    /// Fully qualified names of the columns added by this run.
    pub columns_added: Vec<String>,
}

impl SchemaReport {
    /// Whether the run changed anything.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.migrations_applied == 0 && self.columns_added.is_empty()
    }
}

/// Store that owns the `shop` schema's shape.
pub struct SchemaStore<'a> {
    pool: &'a PgPool,
}

impl<'a> SchemaStore<'a> {
    /// Create a new schema store.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations, then add any missing optional columns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Migration` if a migration fails, or
    /// `RepositoryError::Database` if a column check or `ALTER TABLE` fails.
    pub async fn evolve(&self) -> Result<SchemaReport, RepositoryError> {
        let before = self.applied_migrations().await?;
        MIGRATOR.run(self.pool).await?;
        let after = self.applied_migrations().await?;

        let mut report = SchemaReport {
            migrations_applied: after.saturating_sub(before),
            columns_added: Vec::new(),
        };

        for column in OPTIONAL_COLUMNS {
            if self.column_exists(column).await? {
                continue;
            }
            // Identifiers come from the const table above, never from input
            let ddl = format!(
                "ALTER TABLE {}.{} ADD COLUMN IF NOT EXISTS {} {}",
                column.schema, column.table, column.column, column.definition
            );
            sqlx::query(&ddl).execute(self.pool).await?;
            tracing::info!(column = %column.qualified(), "Added missing column");
            report.columns_added.push(column.qualified());
        }

        if report.is_noop() {
            tracing::debug!("Schema already up to date");
        } else {
            tracing::info!(
                migrations_applied = report.migrations_applied,
                columns_added = report.columns_added.len(),
                "Schema evolved"
            );
        }
        Ok(report)
    }

    /// Check the schema shape: returns the optional columns that are still
    /// missing. An empty result means the schema is ready to serve.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the catalog query fails.
    pub async fn verify(&self) -> Result<Vec<String>, RepositoryError> {
        let mut missing = Vec::new();
        for column in OPTIONAL_COLUMNS {
            if !self.column_exists(column).await? {
                missing.push(column.qualified());
            }
        }
        Ok(missing)
    }

    async fn column_exists(&self, column: &OptionalColumn) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.columns
                WHERE table_schema = $1 AND table_name = $2 AND column_name = $3
            )
            ",
        )
        .bind(column.schema)
        .bind(column.table)
        .bind(column.column)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    async fn applied_migrations(&self) -> Result<usize, RepositoryError> {
        let table_exists: bool =
            sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
                .fetch_one(self.pool)
                .await?;
        if !table_exists {
            return Ok(0);
        }
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM public._sqlx_migrations WHERE success")
                .fetch_one(self.pool)
                .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_attribution_is_optional() {
        let names: Vec<String> = OPTIONAL_COLUMNS.iter().map(OptionalColumn::qualified).collect();
        assert!(names.contains(&"shop.comment.user_id".to_owned()));
    }

    #[test]
    fn test_optional_columns_are_nullable() {
        for column in OPTIONAL_COLUMNS {
            assert!(
                !column.definition.contains("NOT NULL"),
                "{} must be nullable to be added to populated tables",
                column.qualified()
            );
        }
    }

    #[test]
    fn test_report_noop() {
        assert!(SchemaReport::default().is_noop());
        let report = SchemaReport {
            migrations_applied: 0,
            columns_added: vec!["shop.comment.user_id".to_owned()],
        };
        assert!(!report.is_noop());
    }

    #[test]
    fn test_migrations_are_embedded() {
        assert!(MIGRATOR.iter().count() >= 2);
    }
}
