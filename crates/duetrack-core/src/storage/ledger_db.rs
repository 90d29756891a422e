//! SQLite-based storage for obligations, subscriptions, reminders, and incomes.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::{data_dir, migrations, Config};
use crate::error::{DatabaseError, Result};
use crate::model::{
    BillingPeriod, DigitalSubscription, Income, Obligation, ObligationCategory, Reminder,
};
use crate::recurrence::RecurrenceUnit;

// === Helper Functions ===

/// Parse obligation category from database string
fn parse_category(category_str: &str) -> ObligationCategory {
    ObligationCategory::parse(category_str).unwrap_or(ObligationCategory::Other)
}

/// Parse billing period from database string
fn parse_period(period_str: &str) -> BillingPeriod {
    BillingPeriod::parse(period_str).unwrap_or(BillingPeriod::Monthly)
}

/// Parse recurrence unit from database string
fn parse_unit(unit_str: Option<&str>) -> Option<RecurrenceUnit> {
    unit_str.and_then(RecurrenceUnit::parse)
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse an optional datetime column; unparseable values are treated as NULL
fn parse_datetime_opt(dt_str: Option<String>) -> Option<DateTime<Utc>> {
    dt_str.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Build an Obligation from a database row
fn row_to_obligation(row: &rusqlite::Row) -> Result<Obligation, rusqlite::Error> {
    let category_str: String = row.get(3)?;
    let next_due_str: Option<String> = row.get(6)?;
    let unit_str: Option<String> = row.get(8)?;
    let created_at_str: String = row.get(14)?;
    let updated_at_str: String = row.get(15)?;

    Ok(Obligation {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        category: parse_category(&category_str),
        amount: row.get(4)?,
        currency: row.get(5)?,
        next_due: parse_datetime_opt(next_due_str),
        is_recurring: row.get(7)?,
        recurrence_unit: parse_unit(unit_str.as_deref()),
        recurrence_interval: row.get(9)?,
        is_active: row.get(10)?,
        is_done: row.get(11)?,
        account_id: row.get(12)?,
        notes: row.get(13)?,
        created_at: parse_datetime_fallback(&created_at_str),
        updated_at: parse_datetime_fallback(&updated_at_str),
    })
}

/// Build a DigitalSubscription from a database row
fn row_to_subscription(row: &rusqlite::Row) -> Result<DigitalSubscription, rusqlite::Error> {
    let period_str: String = row.get(6)?;
    let first_due_str: String = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    Ok(DigitalSubscription {
        id: row.get(0)?,
        account_id: row.get(1)?,
        owner_id: row.get(2)?,
        provider: row.get(3)?,
        amount: row.get(4)?,
        currency: row.get(5)?,
        period: parse_period(&period_str),
        first_due: parse_datetime_fallback(&first_due_str),
        created_at: parse_datetime_fallback(&created_at_str),
        updated_at: parse_datetime_fallback(&updated_at_str),
    })
}

/// Build a Reminder from a database row
fn row_to_reminder(row: &rusqlite::Row) -> Result<Reminder, rusqlite::Error> {
    let due_at_str: String = row.get(3)?;
    let created_at_str: String = row.get(6)?;

    Ok(Reminder {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        due_at: parse_datetime_fallback(&due_at_str),
        important: row.get(4)?,
        obligation_id: row.get(5)?,
        created_at: parse_datetime_fallback(&created_at_str),
    })
}

/// Build an Income from a database row
fn row_to_income(row: &rusqlite::Row) -> Result<Income, rusqlite::Error> {
    let occurred_at_str: String = row.get(5)?;
    let created_at_str: String = row.get(6)?;

    Ok(Income {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        source: row.get(2)?,
        amount: row.get(3)?,
        currency: row.get(4)?,
        occurred_at: parse_datetime_fallback(&occurred_at_str),
        created_at: parse_datetime_fallback(&created_at_str),
    })
}

const OBLIGATION_COLUMNS: &str = "id, owner_id, name, category, amount, currency, next_due, \
     is_recurring, recurrence_unit, recurrence_interval, is_active, is_done, account_id, notes, \
     created_at, updated_at";

const SUBSCRIPTION_COLUMNS: &str =
    "id, account_id, owner_id, provider, amount, currency, period, first_due, created_at, updated_at";

/// SQLite database for the scheduling ledger.
///
/// Stores obligations, digital subscriptions, reminders, and incomes.
pub struct LedgerDb {
    conn: Connection,
}

impl LedgerDb {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the ledger database, honoring the configured path override and
    /// defaulting to `~/.config/duetrack/duetrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let config = Config::load_or_default();
        let path = match config.database.path {
            Some(p) => std::path::PathBuf::from(p),
            None => data_dir()?.join("duetrack.db"),
        };
        Self::open_at(&path)
    }

    /// Open the ledger database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS obligations (
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

            CREATE TABLE IF NOT EXISTS subscriptions (
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

            CREATE TABLE IF NOT EXISTS reminders (
                id         TEXT PRIMARY KEY,
                owner_id   TEXT NOT NULL,
                title      TEXT NOT NULL,
                due_at     TEXT NOT NULL,
                important  INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS incomes (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL,
                source      TEXT NOT NULL,
                amount      REAL NOT NULL,
                currency    TEXT NOT NULL,
                occurred_at TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            -- Indexes for the sweep scan and per-account lookups
            CREATE INDEX IF NOT EXISTS idx_obligations_next_due ON obligations(next_due);
            CREATE INDEX IF NOT EXISTS idx_obligations_account ON obligations(account_id);",
        )?;

        // Run incremental migrations (v1 -> v2 -> v3, etc.)
        migrations::migrate(&self.conn)?;

        Ok(())
    }

    // === Obligations ===

    /// Insert a new obligation.
    pub fn insert_obligation(&self, ob: &Obligation) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO obligations (id, owner_id, name, category, amount, currency, next_due,
                 is_recurring, recurrence_unit, recurrence_interval, is_active, is_done,
                 account_id, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                ob.id,
                ob.owner_id,
                ob.name,
                ob.category.as_str(),
                ob.amount,
                ob.currency,
                ob.next_due.map(|d| d.to_rfc3339()),
                ob.is_recurring,
                ob.recurrence_unit.map(|u| u.as_str()),
                ob.recurrence_interval,
                ob.is_active,
                ob.is_done,
                ob.account_id,
                ob.notes,
                ob.created_at.to_rfc3339(),
                ob.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch an obligation by id.
    pub fn get_obligation(&self, id: &str) -> Result<Option<Obligation>, DatabaseError> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {OBLIGATION_COLUMNS} FROM obligations WHERE id = ?1"),
                params![id],
                row_to_obligation,
            )
            .optional()?;
        Ok(result)
    }

    /// List obligations for an owner, most urgent first (NULL due dates last).
    pub fn list_obligations(
        &self,
        owner_id: &str,
        include_done: bool,
    ) -> Result<Vec<Obligation>, DatabaseError> {
        let sql = if include_done {
            format!(
                "SELECT {OBLIGATION_COLUMNS} FROM obligations WHERE owner_id = ?1
                 ORDER BY next_due IS NULL, next_due, created_at"
            )
        } else {
            format!(
                "SELECT {OBLIGATION_COLUMNS} FROM obligations
                 WHERE owner_id = ?1 AND is_done = 0
                 ORDER BY next_due IS NULL, next_due, created_at"
            )
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![owner_id], row_to_obligation)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Overwrite an obligation in place.
    pub fn update_obligation(&self, ob: &Obligation) -> Result<(), DatabaseError> {
        let affected = self.conn.execute(
            "UPDATE obligations SET owner_id = ?2, name = ?3, category = ?4, amount = ?5,
                 currency = ?6, next_due = ?7, is_recurring = ?8, recurrence_unit = ?9,
                 recurrence_interval = ?10, is_active = ?11, is_done = ?12, account_id = ?13,
                 notes = ?14, updated_at = ?15
             WHERE id = ?1",
            params![
                ob.id,
                ob.owner_id,
                ob.name,
                ob.category.as_str(),
                ob.amount,
                ob.currency,
                ob.next_due.map(|d| d.to_rfc3339()),
                ob.is_recurring,
                ob.recurrence_unit.map(|u| u.as_str()),
                ob.recurrence_interval,
                ob.is_active,
                ob.is_done,
                ob.account_id,
                ob.notes,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("obligation {}", ob.id)));
        }
        Ok(())
    }

    /// Mark an obligation done. Done obligations are terminal: the sweep
    /// never rolls them forward again.
    pub fn set_done(&self, id: &str) -> Result<(), DatabaseError> {
        let affected = self.conn.execute(
            "UPDATE obligations SET is_done = 1, updated_at = ?2 WHERE id = ?1",
            params![id, Utc::now().to_rfc3339()],
        )?;
        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("obligation {id}")));
        }
        Ok(())
    }

    /// Delete an obligation.
    pub fn delete_obligation(&self, id: &str) -> Result<(), DatabaseError> {
        let affected = self
            .conn
            .execute("DELETE FROM obligations WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("obligation {id}")));
        }
        Ok(())
    }

    /// Obligations linked to a digital account, earliest due first
    /// (NULL due dates last, then oldest created).
    ///
    /// The first row is the synchronizer's "primary" record.
    pub fn obligations_for_account(
        &self,
        account_id: &str,
    ) -> Result<Vec<Obligation>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {OBLIGATION_COLUMNS} FROM obligations WHERE account_id = ?1
             ORDER BY next_due IS NULL, next_due, created_at"
        ))?;
        let rows = stmt.query_map(params![account_id], row_to_obligation)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Recurring, not-done obligations whose due date has passed.
    ///
    /// RFC3339 UTC timestamps compare correctly as text.
    pub fn overdue_recurring(&self, now: DateTime<Utc>) -> Result<Vec<Obligation>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {OBLIGATION_COLUMNS} FROM obligations
             WHERE is_recurring = 1
               AND is_done = 0
               AND recurrence_unit IS NOT NULL
               AND recurrence_interval IS NOT NULL
               AND next_due IS NOT NULL
               AND next_due < ?1
             ORDER BY next_due"
        ))?;
        let rows = stmt.query_map(params![now.to_rfc3339()], row_to_obligation)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Persist a recomputed due date. Only the engine/sweep/synchronizer
    /// write this column.
    pub fn set_next_due(&self, id: &str, due: DateTime<Utc>) -> Result<(), DatabaseError> {
        let affected = self.conn.execute(
            "UPDATE obligations SET next_due = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, due.to_rfc3339(), Utc::now().to_rfc3339()],
        )?;
        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("obligation {id}")));
        }
        Ok(())
    }

    // === Subscriptions ===

    /// Insert or overwrite the subscription for an account.
    ///
    /// Relies on the unique index on `subscriptions(account_id)`.
    pub fn upsert_subscription(&self, sub: &DigitalSubscription) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO subscriptions (id, account_id, owner_id, provider, amount, currency,
                 period, first_due, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(account_id) DO UPDATE SET
                 owner_id = excluded.owner_id,
                 provider = excluded.provider,
                 amount = excluded.amount,
                 currency = excluded.currency,
                 period = excluded.period,
                 first_due = excluded.first_due,
                 updated_at = excluded.updated_at",
            params![
                sub.id,
                sub.account_id,
                sub.owner_id,
                sub.provider,
                sub.amount,
                sub.currency,
                sub.period.as_str(),
                sub.first_due.to_rfc3339(),
                sub.created_at.to_rfc3339(),
                sub.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch the subscription backing an account, if any.
    pub fn subscription_for_account(
        &self,
        account_id: &str,
    ) -> Result<Option<DigitalSubscription>, DatabaseError> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE account_id = ?1"),
                params![account_id],
                row_to_subscription,
            )
            .optional()?;
        Ok(result)
    }

    /// List subscriptions for an owner.
    pub fn list_subscriptions(
        &self,
        owner_id: &str,
    ) -> Result<Vec<DigitalSubscription>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE owner_id = ?1
             ORDER BY provider"
        ))?;
        let rows = stmt.query_map(params![owner_id], row_to_subscription)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete the subscription for an account. Returns the number of rows removed.
    pub fn delete_subscription_for_account(
        &self,
        account_id: &str,
        owner_id: &str,
    ) -> Result<usize, DatabaseError> {
        let affected = self.conn.execute(
            "DELETE FROM subscriptions WHERE account_id = ?1 AND owner_id = ?2",
            params![account_id, owner_id],
        )?;
        Ok(affected)
    }

    /// Delete all obligations linked to an account. Returns the number of rows removed.
    pub fn delete_obligations_for_account(
        &self,
        account_id: &str,
        owner_id: &str,
    ) -> Result<usize, DatabaseError> {
        let affected = self.conn.execute(
            "DELETE FROM obligations WHERE account_id = ?1 AND owner_id = ?2",
            params![account_id, owner_id],
        )?;
        Ok(affected)
    }

    // === Reminders ===

    /// Insert a reminder.
    pub fn insert_reminder(&self, reminder: &Reminder) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO reminders (id, owner_id, title, due_at, important, obligation_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                reminder.id,
                reminder.owner_id,
                reminder.title,
                reminder.due_at.to_rfc3339(),
                reminder.important,
                reminder.obligation_id,
                reminder.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List reminders for an owner, soonest first.
    pub fn list_reminders(&self, owner_id: &str) -> Result<Vec<Reminder>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, title, due_at, important, obligation_id, created_at
             FROM reminders WHERE owner_id = ?1 ORDER BY due_at",
        )?;
        let rows = stmt.query_map(params![owner_id], row_to_reminder)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete a reminder.
    pub fn delete_reminder(&self, id: &str) -> Result<(), DatabaseError> {
        let affected = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("reminder {id}")));
        }
        Ok(())
    }

    // === Incomes ===

    /// Insert an income record.
    pub fn insert_income(&self, income: &Income) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO incomes (id, owner_id, source, amount, currency, occurred_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                income.id,
                income.owner_id,
                income.source,
                income.amount,
                income.currency,
                income.occurred_at.to_rfc3339(),
                income.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List incomes for an owner, most recent occurrence first.
    pub fn list_incomes(&self, owner_id: &str) -> Result<Vec<Income>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, source, amount, currency, occurred_at, created_at
             FROM incomes WHERE owner_id = ?1 ORDER BY occurred_at DESC",
        )?;
        let rows = stmt.query_map(params![owner_id], row_to_income)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
