//! Fund Balance Engine
//! Mission: Compute period and all-time balance reports over the ledger
//!
//! Earmarked money stays earmarked: a fund's remaining balance is its
//! approved amount minus every expense ever tagged to it, no matter which
//! reporting window was requested. Period income/expense are window-scoped
//! only; the asymmetry is intentional (funds are spent down over time,
//! they never top back up).

use crate::ledger::{LedgerError, LedgerRead, LedgerStore};
use crate::models::{CounterpartyEntry, FundBalanceEntry, MovementKind, PeriodReport};

pub struct BalanceEngine<'a> {
    store: &'a LedgerStore,
}

impl<'a> BalanceEngine<'a> {
    pub fn new(store: &'a LedgerStore) -> Self {
        Self { store }
    }

    /// Report for one month of one year.
    pub async fn monthly_report(&self, year: i32, month: u32) -> Result<PeriodReport, LedgerError> {
        validate_month(month)?;
        self.period_report(year, Some(month)).await
    }

    /// Report for a whole year.
    pub async fn annual_report(&self, year: i32) -> Result<PeriodReport, LedgerError> {
        self.period_report(year, None).await
    }

    /// Income/expense totals per counterparty active in the window.
    pub async fn counterparty_report(
        &self,
        year: i32,
        month: Option<u32>,
    ) -> Result<Vec<CounterpartyEntry>, LedgerError> {
        if let Some(month) = month {
            validate_month(month)?;
        }

        let read = self.store.read().await;
        let entries = read
            .sum_by_counterparty(year, month)?
            .into_iter()
            .map(|t| CounterpartyEntry {
                net_balance: t.income - t.expense,
                name: t.name,
                period_income: t.income,
                period_expense: t.expense,
            })
            .collect();
        Ok(entries)
    }

    async fn period_report(
        &self,
        year: i32,
        month: Option<u32>,
    ) -> Result<PeriodReport, LedgerError> {
        // One read guard for the whole report: every aggregate below sees
        // the same rows, so a report is all-or-nothing over one snapshot.
        let read = self.store.read().await;

        // General balance across ALL movements in the window, fund-tagged
        // or not.
        let total_income = read.sum_by_kind(MovementKind::Income, Some(year), month, None)?;
        let total_expense = read.sum_by_kind(MovementKind::Expense, Some(year), month, None)?;

        let mut funds = Vec::new();
        for fund in read.all_funds()? {
            funds.push(fund_entry(&read, &fund, year, month)?);
        }

        Ok(PeriodReport {
            period_label: match month {
                Some(m) => format!("{}-{:02}", year, m),
                None => year.to_string(),
            },
            total_income,
            total_expense,
            net_balance: total_income - total_expense,
            funds,
        })
    }
}

fn fund_entry(
    read: &LedgerRead<'_>,
    fund: &crate::models::Fund,
    year: i32,
    month: Option<u32>,
) -> Result<FundBalanceEntry, LedgerError> {
    // All-time spend, unbounded by the requested period.
    let cumulative_spent = read.sum_by_kind(MovementKind::Expense, None, None, Some(fund.id))?;

    // Window-scoped visibility figures.
    let period_income = read.sum_by_kind(MovementKind::Income, Some(year), month, Some(fund.id))?;
    let period_expense =
        read.sum_by_kind(MovementKind::Expense, Some(year), month, Some(fund.id))?;

    Ok(FundBalanceEntry {
        fund_id: fund.id,
        label: fund.label.clone(),
        fiscal_year: fund.fiscal_year,
        approved_amount: fund.approved_amount,
        period_income,
        period_expense,
        cumulative_spent,
        // May go negative when overspent; that is a reportable fact, not
        // an error.
        remaining_balance: fund.approved_amount - cumulative_spent,
    })
}

fn validate_month(month: u32) -> Result<(), LedgerError> {
    if !(1..=12).contains(&month) {
        return Err(LedgerError::Validation(format!(
            "month must be between 1 and 12, got {}",
            month
        )));
    }
    Ok(())
}
