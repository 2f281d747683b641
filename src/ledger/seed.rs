//! Demo data seeding.
//!
//! One canonical seeding routine: the funds, counterparties, and opening
//! movements of the 2025 school year. Idempotent, so restarting with
//! `SEED_DEMO_DATA=1` never duplicates rows.

use crate::ledger::{LedgerError, LedgerStore};
use crate::models::{MovementKind, NewCounterparty, NewFund, NewMovement};
use chrono::NaiveDate;
use tracing::info;

/// Populate the ledger with demo rows. Skips entirely when funds exist.
pub async fn seed_demo_data(store: &LedgerStore) -> Result<(), LedgerError> {
    if !store.all_funds().await?.is_empty() {
        info!("Ledger already populated, skipping demo seed");
        return Ok(());
    }

    let estado = store
        .insert_fund(&NewFund {
            label: "Estado".to_string(),
            approved_amount: 50000.00,
            fiscal_year: 2025,
            notes: Some("Financiamento anual".to_string()),
        })
        .await?;
    let paroquia = store
        .insert_fund(&NewFund {
            label: "Paróquia".to_string(),
            approved_amount: 5000.00,
            fiscal_year: 2025,
            notes: Some("Doação para material".to_string()),
        })
        .await?;

    let papelaria = store
        .insert_counterparty(&NewCounterparty {
            name: "Papelaria ABC".to_string(),
            tax_id: "123456789".to_string(),
            email: Some("abc@email.com".to_string()),
            phone: Some("912233445".to_string()),
        })
        .await?;
    store
        .insert_counterparty(&NewCounterparty {
            name: "Cantina XYZ".to_string(),
            tax_id: "987654321".to_string(),
            email: Some("xyz@email.com".to_string()),
            phone: Some("913344556".to_string()),
        })
        .await?;

    let openings = [
        (
            MovementKind::Income,
            50000.00,
            "2025-01-10",
            "Financiamento Estado",
            Some(estado),
            None,
        ),
        (
            MovementKind::Income,
            5000.00,
            "2025-01-15",
            "Doação Paróquia",
            Some(paroquia),
            None,
        ),
        (
            MovementKind::Expense,
            2000.00,
            "2025-01-20",
            "Compra material escolar",
            None,
            Some(papelaria),
        ),
    ];

    for (kind, amount, day, description, fund_id, counterparty_id) in openings {
        store
            .record(&NewMovement {
                kind,
                amount,
                date: NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .map_err(|e| LedgerError::Validation(e.to_string()))?,
                description: Some(description.to_string()),
                fund_id,
                counterparty_id,
            })
            .await?;
    }

    info!("Seeded demo ledger data (2 funds, 2 counterparties, 3 movements)");
    Ok(())
}
