//! End-to-end test of the fund balance pipeline: seed the demo ledger,
//! then run the reports a client would request over the API.

use escola_backend::balance::BalanceEngine;
use escola_backend::ledger::{seed::seed_demo_data, LedgerStore};
use escola_backend::models::{MovementKind, NewMovement};
use tempfile::NamedTempFile;

#[tokio::test]
async fn seeded_ledger_produces_consistent_reports() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = LedgerStore::new(temp_file.path().to_str().unwrap()).unwrap();
    seed_demo_data(&store).await.unwrap();

    let engine = BalanceEngine::new(&store);

    // Annual view of the seeded year
    let annual = engine.annual_report(2025).await.unwrap();
    assert_eq!(annual.period_label, "2025");
    assert_eq!(annual.total_income, 55000.00);
    assert_eq!(annual.total_expense, 2000.00);
    assert_eq!(annual.net_balance, 53000.00);

    // Seed expenses are untagged, so both funds are still whole
    assert_eq!(annual.funds.len(), 2);
    for fund in &annual.funds {
        assert_eq!(fund.cumulative_spent, 0.0);
        assert_eq!(fund.remaining_balance, fund.approved_amount);
    }

    // January view carries all the seed movements
    let january = engine.monthly_report(2025, 1).await.unwrap();
    assert_eq!(january.total_income, 55000.00);
    assert_eq!(january.total_expense, 2000.00);

    // A quiet month still reports every fund, with zero period figures
    let june = engine.monthly_report(2025, 6).await.unwrap();
    assert_eq!(june.total_income, 0.0);
    assert_eq!(june.funds.len(), 2);
    assert!(june.funds.iter().all(|f| f.period_income == 0.0));
}

#[tokio::test]
async fn fund_spend_down_is_visible_from_any_period() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = LedgerStore::new(temp_file.path().to_str().unwrap()).unwrap();
    seed_demo_data(&store).await.unwrap();

    let estado = store.all_funds().await.unwrap()[0].clone();
    assert_eq!(estado.label, "Estado");

    // Spend against the Estado fund across two years
    for (amount, day) in [(1500.00, "2025-02-03"), (750.00, "2026-01-09")] {
        store
            .record(&NewMovement {
                kind: MovementKind::Expense,
                amount,
                date: day.parse().unwrap(),
                description: Some("Equipamento laboratório".to_string()),
                fund_id: Some(estado.id),
                counterparty_id: None,
            })
            .await
            .unwrap();
    }

    let engine = BalanceEngine::new(&store);

    // Whatever window is requested, the fund's remaining balance reflects
    // the full spend-down history.
    for report in [
        engine.annual_report(2025).await.unwrap(),
        engine.annual_report(2026).await.unwrap(),
        engine.monthly_report(2026, 12).await.unwrap(),
    ] {
        let entry = report
            .funds
            .iter()
            .find(|f| f.fund_id == estado.id)
            .unwrap();
        assert_eq!(entry.cumulative_spent, 2250.00);
        assert_eq!(entry.remaining_balance, estado.approved_amount - 2250.00);
    }

    // Period expense follows the window
    let feb = engine.monthly_report(2025, 2).await.unwrap();
    let entry = feb.funds.iter().find(|f| f.fund_id == estado.id).unwrap();
    assert_eq!(entry.period_expense, 1500.00);
}

#[tokio::test]
async fn counterparty_report_tracks_seeded_supplier() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = LedgerStore::new(temp_file.path().to_str().unwrap()).unwrap();
    seed_demo_data(&store).await.unwrap();

    let engine = BalanceEngine::new(&store);

    let entries = engine.counterparty_report(2025, Some(1)).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Papelaria ABC");
    assert_eq!(entries[0].period_expense, 2000.00);
    assert_eq!(entries[0].net_balance, -2000.00);

    // The cantina has no movements yet, so it never appears
    assert!(entries.iter().all(|e| e.name != "Cantina XYZ"));
}
