//! SQLite-backed ledger store.
//!
//! Owns the connection; report computations take the lock once via
//! [`LedgerStore::read`] so every aggregate in a report sees the same rows.

use crate::ledger::LedgerError;
use crate::models::{
    Counterparty, Fund, Movement, MovementKind, NewCounterparty, NewFund, NewMovement,
};
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, types::ToSql, Connection};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

/// Income/expense totals for one counterparty within a period.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterpartyTotals {
    pub name: String,
    pub income: f64,
    pub expense: f64,
}

#[derive(Clone)]
pub struct LedgerStore {
    conn: Arc<Mutex<Connection>>,
}

impl LedgerStore {
    /// Open (or create) the ledger database and bootstrap the schema.
    pub fn new(db_path: &str) -> Result<Self, LedgerError> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS funds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                approved_amount REAL NOT NULL,
                fiscal_year INTEGER NOT NULL,
                notes TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS counterparties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                tax_id TEXT UNIQUE NOT NULL,
                email TEXT,
                phone TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS movements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
                amount REAL NOT NULL CHECK (amount >= 0),
                date TEXT NOT NULL,
                description TEXT,
                fund_id INTEGER REFERENCES funds(id)
                    ON DELETE SET NULL ON UPDATE CASCADE,
                counterparty_id INTEGER REFERENCES counterparties(id)
                    ON DELETE SET NULL ON UPDATE CASCADE
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_movements_date ON movements(date)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_movements_fund ON movements(fund_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_movements_counterparty ON movements(counterparty_id)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Acquire a consistent read view for the duration of one report.
    pub async fn read(&self) -> LedgerRead<'_> {
        LedgerRead {
            conn: self.conn.lock().await,
        }
    }

    /// Append a movement. Amounts carry no sign; direction lives in `kind`.
    pub async fn record(&self, movement: &NewMovement) -> Result<i64, LedgerError> {
        if !movement.amount.is_finite() || movement.amount < 0.0 {
            return Err(LedgerError::Validation(format!(
                "movement amount must be a non-negative number, got {}",
                movement.amount
            )));
        }

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO movements (kind, amount, date, description, fund_id, counterparty_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                movement.kind.as_str(),
                movement.amount,
                movement.date.to_string(),
                movement.description.as_deref(),
                movement.fund_id,
                movement.counterparty_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Delete a movement as an administrative correction.
    ///
    /// Returns false when no such movement exists. The referenced fund and
    /// counterparty are left untouched.
    pub async fn delete_movement(&self, id: i64) -> Result<bool, LedgerError> {
        let conn = self.conn.lock().await;
        let rows = conn.execute("DELETE FROM movements WHERE id = ?1", params![id])?;
        if rows > 0 {
            info!(movement_id = id, "Movement deleted (administrative correction)");
        }
        Ok(rows > 0)
    }

    /// Create a fund. The approved amount is fixed for the fund's lifetime.
    pub async fn insert_fund(&self, fund: &NewFund) -> Result<i64, LedgerError> {
        if !fund.approved_amount.is_finite() || fund.approved_amount < 0.0 {
            return Err(LedgerError::Validation(format!(
                "fund approved amount must be a non-negative number, got {}",
                fund.approved_amount
            )));
        }

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO funds (label, approved_amount, fiscal_year, notes)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                fund.label,
                fund.approved_amount,
                fund.fiscal_year,
                fund.notes.as_deref(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub async fn all_funds(&self) -> Result<Vec<Fund>, LedgerError> {
        let conn = self.conn.lock().await;
        query_all_funds(&conn)
    }

    pub async fn insert_counterparty(
        &self,
        counterparty: &NewCounterparty,
    ) -> Result<i64, LedgerError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO counterparties (name, tax_id, email, phone)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                counterparty.name,
                counterparty.tax_id,
                counterparty.email.as_deref(),
                counterparty.phone.as_deref(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub async fn list_counterparties(&self) -> Result<Vec<Counterparty>, LedgerError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, tax_id, email, phone FROM counterparties ORDER BY name ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Counterparty {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    tax_id: row.get(2)?,
                    email: row.get(3)?,
                    phone: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete a counterparty. Movements that referenced it keep their rows;
    /// the reference is nulled by the foreign key.
    pub async fn delete_counterparty(&self, id: i64) -> Result<bool, LedgerError> {
        let conn = self.conn.lock().await;
        let rows = conn.execute("DELETE FROM counterparties WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Most recent movements first.
    pub async fn list_movements(&self, limit: usize) -> Result<Vec<Movement>, LedgerError> {
        let limit = limit.clamp(1, 1000) as i64;
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, kind, amount, date, description, fund_id, counterparty_id
             FROM movements ORDER BY date DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], map_movement_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Read view over the locked connection. Holding this guard for the
/// duration of a report is what makes the report all-or-nothing over one
/// consistent set of rows.
pub struct LedgerRead<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl LedgerRead<'_> {
    /// Sum of amounts for movements matching kind and the optional
    /// year/month/fund filters. Returns 0 when no rows match.
    pub fn sum_by_kind(
        &self,
        kind: MovementKind,
        year: Option<i32>,
        month: Option<u32>,
        fund_id: Option<i64>,
    ) -> Result<f64, LedgerError> {
        let mut sql =
            String::from("SELECT COALESCE(SUM(amount), 0.0) FROM movements WHERE kind = ?");
        let mut filters: Vec<Box<dyn ToSql>> = vec![Box::new(kind.as_str().to_string())];

        if let Some(year) = year {
            sql.push_str(" AND CAST(strftime('%Y', date) AS INTEGER) = ?");
            filters.push(Box::new(year));
        }
        if let Some(month) = month {
            sql.push_str(" AND CAST(strftime('%m', date) AS INTEGER) = ?");
            filters.push(Box::new(month));
        }
        if let Some(fund_id) = fund_id {
            sql.push_str(" AND fund_id = ?");
            filters.push(Box::new(fund_id));
        }

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let total: f64 = stmt.query_row(
            params_from_iter(filters.iter().map(|f| f.as_ref())),
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Income/expense totals grouped by counterparty for the given window.
    ///
    /// Only counterparties with at least one matching movement appear;
    /// movements without a counterparty never do.
    pub fn sum_by_counterparty(
        &self,
        year: i32,
        month: Option<u32>,
    ) -> Result<Vec<CounterpartyTotals>, LedgerError> {
        let mut sql = String::from(
            "SELECT c.name,
                    COALESCE(SUM(CASE WHEN m.kind = 'income' THEN m.amount ELSE 0.0 END), 0.0),
                    COALESCE(SUM(CASE WHEN m.kind = 'expense' THEN m.amount ELSE 0.0 END), 0.0)
             FROM movements m
             JOIN counterparties c ON m.counterparty_id = c.id
             WHERE CAST(strftime('%Y', m.date) AS INTEGER) = ?",
        );
        let mut filters: Vec<Box<dyn ToSql>> = vec![Box::new(year)];

        if let Some(month) = month {
            sql.push_str(" AND CAST(strftime('%m', m.date) AS INTEGER) = ?");
            filters.push(Box::new(month));
        }
        sql.push_str(" GROUP BY c.id, c.name ORDER BY c.name ASC");

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(
                params_from_iter(filters.iter().map(|f| f.as_ref())),
                |row| {
                    Ok(CounterpartyTotals {
                        name: row.get(0)?,
                        income: row.get(1)?,
                        expense: row.get(2)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Every fund, insertion order. Order is not significant to the engine.
    pub fn all_funds(&self) -> Result<Vec<Fund>, LedgerError> {
        query_all_funds(&self.conn)
    }
}

fn query_all_funds(conn: &Connection) -> Result<Vec<Fund>, LedgerError> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, label, approved_amount, fiscal_year, notes FROM funds ORDER BY id ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Fund {
                id: row.get(0)?,
                label: row.get(1)?,
                approved_amount: row.get(2)?,
                fiscal_year: row.get(3)?,
                notes: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_movement_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Movement> {
    let kind_str: String = row.get(1)?;
    let date_str: String = row.get(3)?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Movement {
        id: row.get(0)?,
        // The CHECK constraint keeps unknown kinds out of the table.
        kind: MovementKind::from_str(&kind_str).unwrap_or(MovementKind::Expense),
        amount: row.get(2)?,
        date,
        description: row.get(4)?,
        fund_id: row.get(5)?,
        counterparty_id: row.get(6)?,
    })
}
