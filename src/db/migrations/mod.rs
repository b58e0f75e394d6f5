//! Database schema migrations.
//!
//! Migration files live in this directory with the naming convention:
//! - `migration_NN_up.sql` - upgrades the schema from version `NN-1` to `NN`
//! - `migration_NN_down.sql` - downgrades the schema from version `NN` to `NN-1`

use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use crate::Result;

/// The schema version this build of the program expects.
pub(crate) const CURRENT_VERSION: i32 = 1;

struct Migration {
    /// The version this migration brings the database to (when going up).
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// Runs migrations to bring the database from `current_ver` to `target_ver`,
/// in either direction. Each step executes inside a transaction together with
/// its `schema_version` bump. All required migrations are checked for
/// existence before any of them run.
pub(crate) async fn run(pool: &SqlitePool, current_ver: i32, target_ver: i32) -> Result<()> {
    if current_ver == target_ver {
        debug!("Schema already at version {target_ver}, no migrations needed");
        return Ok(());
    }

    let steps: Vec<i32> = if current_ver < target_ver {
        ((current_ver + 1)..=target_ver).collect()
    } else {
        ((target_ver + 1)..=current_ver).rev().collect()
    };
    for version in &steps {
        if !MIGRATIONS.iter().any(|m| m.version == *version) {
            bail!(
                "Migration {version} is missing but required to move the schema \
                from version {current_ver} to {target_ver}"
            );
        }
    }

    for version in steps {
        let migration = MIGRATIONS
            .iter()
            .find(|m| m.version == version)
            .with_context(|| format!("Migration {version} not found"))?;
        if current_ver < target_ver {
            debug!("Applying migration {version:02} (up)");
            apply(pool, migration.up_sql, version).await?;
        } else {
            debug!("Applying migration {version:02} (down)");
            apply(pool, migration.down_sql, version - 1).await?;
        }
    }

    debug!("Migration complete, schema now at version {target_ver}");
    Ok(())
}

/// Executes one migration's SQL and records the new version, transactionally.
async fn apply(pool: &SqlitePool, sql: &str, new_version: i32) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin migration transaction")?;

    tx.execute(sql)
        .await
        .context("Failed to execute migration SQL")?;

    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await
        .context("Failed to clear schema_version")?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(new_version)
        .execute(&mut *tx)
        .await
        .context("Failed to record schema version")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")?;
    Ok(())
}
