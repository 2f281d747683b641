//! Domain Models
//! Mission: Define the financial and reporting data structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a financial movement.
///
/// The amount itself is always non-negative; the direction lives here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MovementKind {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "expense")]
    Expense,
}

impl MovementKind {
    pub fn as_str(&self) -> &str {
        match self {
            MovementKind::Income => "income",
            MovementKind::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(MovementKind::Income),
            "expense" => Some(MovementKind::Expense),
            _ => None,
        }
    }
}

/// An earmarked grant/budget with a fixed approved amount.
///
/// Created once when the grant is approved; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fund {
    pub id: i64,
    pub label: String,
    pub approved_amount: f64,
    pub fiscal_year: i32,
    pub notes: Option<String>,
}

/// Request body for creating a fund.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFund {
    pub label: String,
    pub approved_amount: f64,
    pub fiscal_year: i32,
    pub notes: Option<String>,
}

/// An external party (supplier) referenced, never owned, by movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: i64,
    pub name: String,
    pub tax_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Request body for creating a counterparty.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCounterparty {
    pub name: String,
    pub tax_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A single dated financial event, immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    pub kind: MovementKind,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub fund_id: Option<i64>,
    pub counterparty_id: Option<i64>,
}

/// Request body for recording a movement.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub fund_id: Option<i64>,
    pub counterparty_id: Option<i64>,
}

/// Per-fund line in a period report.
///
/// `cumulative_spent` and `remaining_balance` are all-time figures,
/// independent of the requested period; `period_income`/`period_expense`
/// are scoped to the requested window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundBalanceEntry {
    pub fund_id: i64,
    pub label: String,
    pub fiscal_year: i32,
    pub approved_amount: f64,
    pub period_income: f64,
    pub period_expense: f64,
    pub cumulative_spent: f64,
    pub remaining_balance: f64,
}

/// Aggregated income/expense/balance for a year or year+month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodReport {
    /// "YYYY-MM" for monthly reports, "YYYY" for annual ones.
    pub period_label: String,
    pub total_income: f64,
    pub total_expense: f64,
    pub net_balance: f64,
    pub funds: Vec<FundBalanceEntry>,
}

/// Per-counterparty line in the grouped report.
///
/// Counterparties with no movements in the window are omitted entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CounterpartyEntry {
    pub name: String,
    pub period_income: f64,
    pub period_expense: f64,
    pub net_balance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_kind_serialization() {
        let income = MovementKind::Income;
        let json = serde_json::to_string(&income).unwrap();
        assert_eq!(json, r#""income""#);

        let expense: MovementKind = serde_json::from_str(r#""expense""#).unwrap();
        assert_eq!(expense, MovementKind::Expense);
    }

    #[test]
    fn test_movement_kind_string_conversion() {
        assert_eq!(MovementKind::Income.as_str(), "income");
        assert_eq!(MovementKind::Expense.as_str(), "expense");

        assert_eq!(MovementKind::from_str("income"), Some(MovementKind::Income));
        assert_eq!(MovementKind::from_str("EXPENSE"), Some(MovementKind::Expense));
        assert_eq!(MovementKind::from_str("transfer"), None);
    }

    #[test]
    fn test_new_movement_deserializes_from_api_payload() {
        let payload = r#"{
            "kind": "expense",
            "amount": 1250.50,
            "date": "2024-02-10",
            "description": "Lab equipment",
            "fund_id": 1,
            "counterparty_id": null
        }"#;

        let movement: NewMovement = serde_json::from_str(payload).unwrap();
        assert_eq!(movement.kind, MovementKind::Expense);
        assert_eq!(movement.amount, 1250.50);
        assert_eq!(movement.fund_id, Some(1));
        assert!(movement.counterparty_id.is_none());
    }
}
