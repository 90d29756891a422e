//! Database schema migrations for duetrack.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            0
        } else {
            log::warn!("failed to read schema_version: {e}");
            0
        }
    })
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: Initial schema (baseline).
///
/// A no-op since the tables are created by LedgerDb::migrate() directly.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    set_schema_version(conn, 1)?;
    Ok(())
}

/// Migration v2: Link reminders to obligations.
///
/// Adds `reminders.obligation_id` for cross-referencing in horizon views.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch("ALTER TABLE reminders ADD COLUMN obligation_id TEXT;")?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [2])?;

    tx.commit()?;
    Ok(())
}

/// Migration v3: Enforce the at-most-one-per-account invariants.
///
/// Earlier versions could accumulate several obligations and subscription
/// rows for one digital account. This migration keeps, per account, the
/// obligation with the earliest due date (NULL due dates last, then oldest
/// created) and the most recently updated subscription, then adds the unique
/// subscription index the synchronizer's upsert relies on.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "DELETE FROM obligations
         WHERE account_id IS NOT NULL
           AND id NOT IN (
               SELECT id FROM (
                   SELECT id, ROW_NUMBER() OVER (
                       PARTITION BY account_id
                       ORDER BY next_due IS NULL, next_due, created_at
                   ) AS rn
                   FROM obligations
                   WHERE account_id IS NOT NULL
               ) WHERE rn = 1
           )",
        [],
    )?;

    tx.execute(
        "DELETE FROM subscriptions
         WHERE id NOT IN (
             SELECT id FROM (
                 SELECT id, ROW_NUMBER() OVER (
                     PARTITION BY account_id
                     ORDER BY updated_at DESC
                 ) AS rn
                 FROM subscriptions
             ) WHERE rn = 1
         )",
        [],
    )?;

    tx.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_subscriptions_account_unique
         ON subscriptions(account_id)",
        [],
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [3])?;

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_v1_schema(conn: &Connection) {
        conn.execute_batch(
            "CREATE TABLE obligations (
                id                  TEXT PRIMARY KEY,
                owner_id            TEXT NOT NULL,
                name                TEXT NOT NULL,
                category            TEXT NOT NULL DEFAULT 'payment',
                amount              REAL,
                currency            TEXT NOT NULL DEFAULT 'USD',
                next_due            TEXT,
                is_recurring        INTEGER NOT NULL DEFAULT 0,
                recurrence_unit     TEXT,
                recurrence_interval INTEGER,
                is_active           INTEGER NOT NULL DEFAULT 1,
                is_done             INTEGER NOT NULL DEFAULT 0,
                account_id          TEXT,
                notes               TEXT,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE TABLE subscriptions (
                id         TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                owner_id   TEXT NOT NULL,
                provider   TEXT NOT NULL,
                amount     REAL NOT NULL,
                currency   TEXT NOT NULL,
                period     TEXT NOT NULL,
                first_due  TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE reminders (
                id         TEXT PRIMARY KEY,
                owner_id   TEXT NOT NULL,
                title      TEXT NOT NULL,
                due_at     TEXT NOT NULL,
                important  INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );",
        )
        .unwrap();
    }

    fn insert_obligation(conn: &Connection, id: &str, account: &str, due: Option<&str>, created: &str) {
        conn.execute(
            "INSERT INTO obligations (id, owner_id, name, next_due, account_id, created_at, updated_at)
             VALUES (?1, 'o', 'x', ?2, ?3, ?4, ?4)",
            rusqlite::params![id, due, account, created],
        )
        .unwrap();
    }

    #[test]
    fn migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        create_v1_schema(&conn);

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 3);

        // reminders.obligation_id exists after v2
        conn.execute(
            "INSERT INTO reminders (id, owner_id, title, due_at, important, obligation_id, created_at)
             VALUES ('r1', 'o', 't', '2024-01-01T00:00:00+00:00', 0, 'ob1', '2024-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_v1_schema(&conn);

        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 3);
    }

    #[test]
    fn v3_collapses_duplicate_account_obligations() {
        let conn = Connection::open_in_memory().unwrap();
        create_v1_schema(&conn);

        // Three obligations for one account: the earliest-due survives.
        insert_obligation(&conn, "keep", "acc-1", Some("2024-02-01T00:00:00+00:00"), "2024-01-01T00:00:00+00:00");
        insert_obligation(&conn, "later", "acc-1", Some("2024-03-01T00:00:00+00:00"), "2024-01-02T00:00:00+00:00");
        insert_obligation(&conn, "undated", "acc-1", None, "2024-01-03T00:00:00+00:00");
        // Unlinked obligations are never touched.
        insert_obligation(&conn, "manual", "acc-2", None, "2024-01-01T00:00:00+00:00");
        conn.execute("UPDATE obligations SET account_id = NULL WHERE id = 'manual'", [])
            .unwrap();

        migrate(&conn).unwrap();

        let ids: Vec<String> = conn
            .prepare("SELECT id FROM obligations ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(ids, vec!["keep".to_string(), "manual".to_string()]);
    }

    #[test]
    fn v3_collapses_duplicate_subscriptions_and_enforces_uniqueness() {
        let conn = Connection::open_in_memory().unwrap();
        create_v1_schema(&conn);

        for (id, updated) in [("s1", "2024-01-01T00:00:00+00:00"), ("s2", "2024-02-01T00:00:00+00:00")] {
            conn.execute(
                "INSERT INTO subscriptions (id, account_id, owner_id, provider, amount, currency, period, first_due, created_at, updated_at)
                 VALUES (?1, 'acc-1', 'o', 'p', 10.0, 'USD', 'monthly', '2024-01-01T00:00:00+00:00', ?2, ?2)",
                rusqlite::params![id, updated],
            )
            .unwrap();
        }

        migrate(&conn).unwrap();

        let (count, id): (i64, String) = conn
            .query_row("SELECT COUNT(*), MAX(id) FROM subscriptions", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(id, "s2");

        // The unique index now rejects a second row for the same account.
        let dup = conn.execute(
            "INSERT INTO subscriptions (id, account_id, owner_id, provider, amount, currency, period, first_due, created_at, updated_at)
             VALUES ('s3', 'acc-1', 'o', 'p', 10.0, 'USD', 'monthly', '2024-01-01T00:00:00+00:00', 'x', 'x')",
            [],
        );
        assert!(dup.is_err());
    }
}
