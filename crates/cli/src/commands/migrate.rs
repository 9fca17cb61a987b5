//! Schema evolution command.
//!
//! Runs the embedded storefront migrations, then adds any optional column a
//! database adopted from an older deployment is missing. Running it again is
//! a no-op.

use litus_storefront::db::SchemaStore;

use super::{CommandError, connect};

/// Evolve the storefront schema.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let report = SchemaStore::new(&pool).evolve().await?;

    if report.is_noop() {
        tracing::info!("Schema already up to date");
    } else {
        tracing::info!(
            migrations_applied = report.migrations_applied,
            columns_added = ?report.columns_added,
            "Schema evolved"
        );
    }
    Ok(())
}
