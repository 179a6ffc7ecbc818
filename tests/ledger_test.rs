mod common;

use anyhow::Result;
use budget_tracker::application::{AppError, BudgetService};
use budget_tracker::domain::{CategoryTotal, LedgerSummary, MAX_AMOUNT_CENTS};
use budget_tracker::storage::TRANSACTIONS_KEY;
use common::{FlakyStore, SampleLedger, day, form, memory_service, reopen, test_service};

#[tokio::test]
async fn test_empty_ledger_summary() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let summary = service.summary();
    assert_eq!(summary.balance, 0);
    assert_eq!(summary.income, 0);
    assert_eq!(summary.expense, 0);
    assert!(summary.categories.is_empty());
    assert!(service.expense_chart().is_none());

    Ok(())
}

#[tokio::test]
async fn test_sample_ledger_summary() -> Result<()> {
    let (mut service, _temp) = test_service().await?;
    SampleLedger::record(&mut service).await?;

    let summary = service.summary();
    assert_eq!(summary.balance, 65000);
    assert_eq!(summary.income, 100000);
    assert_eq!(summary.expense, 35000);
    assert_eq!(
        summary.categories,
        vec![
            CategoryTotal {
                category: "Food".into(),
                total: 25000
            },
            CategoryTotal {
                category: "Transportation".into(),
                total: 10000
            },
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_category_is_stored_with_canonical_name() -> Result<()> {
    let mut service = memory_service().await?;

    let transaction = service
        .add_transaction(form("Taxi", "-12.50", "TRANSPORTATION", "2024-02-01"))
        .await?;

    assert_eq!(transaction.category, "Transportation");
    assert_eq!(transaction.amount_cents, -1250);
    assert_eq!(transaction.date, day("2024-02-01"));
    Ok(())
}

#[tokio::test]
async fn test_transactions_persist_across_reopen() -> Result<()> {
    let (mut service, temp) = test_service().await?;
    let recorded = SampleLedger::record(&mut service).await?;
    drop(service);

    let service = reopen(&temp).await?;
    assert_eq!(service.transactions(), recorded.as_slice());
    assert_eq!(service.summary().balance, 65000);

    Ok(())
}

#[tokio::test]
async fn test_remove_transaction_recomputes_aggregates() -> Result<()> {
    let (mut service, temp) = test_service().await?;
    let recorded = SampleLedger::record(&mut service).await?;
    let groceries = &recorded[1];

    assert!(service.remove_transaction(groceries.id).await?);

    let remaining: Vec<_> = recorded
        .iter()
        .filter(|t| t.id != groceries.id)
        .cloned()
        .collect();
    assert_eq!(service.summary(), LedgerSummary::compute(&remaining));
    assert_eq!(service.summary().expense, 15000);

    // The removal was persisted
    let reopened = reopen(&temp).await?;
    assert_eq!(reopened.transactions(), remaining.as_slice());

    Ok(())
}

#[tokio::test]
async fn test_remove_absent_id_is_noop() -> Result<()> {
    let (mut service, _temp) = test_service().await?;
    let recorded = SampleLedger::record(&mut service).await?;

    assert!(service.remove_transaction(recorded[0].id).await?);
    let before = service.summary();

    assert!(!service.remove_transaction(recorded[0].id).await?);
    assert!(!service.remove_transaction(uuid::Uuid::new_v4()).await?);
    assert_eq!(service.summary(), before);
    assert_eq!(service.transactions().len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_validation_errors() -> Result<()> {
    let mut service = memory_service().await?;

    let cases = [
        (form("", "10", "Food", "2024-01-01"), "description"),
        (form("Lunch", "  ", "Food", "2024-01-01"), "amount"),
        (form("Lunch", "10", "", "2024-01-01"), "category"),
        (form("Lunch", "10", "Food", ""), "date"),
    ];
    for (input, field) in cases {
        match service.add_transaction(input).await {
            Err(AppError::MissingField(f)) => assert_eq!(f, field),
            other => panic!("expected missing {}, got {:?}", field, other),
        }
    }

    assert!(matches!(
        service
            .add_transaction(form("Lunch", "ten", "Food", "2024-01-01"))
            .await,
        Err(AppError::InvalidAmount(_))
    ));
    assert!(matches!(
        service
            .add_transaction(form("Lunch", "0.00", "Food", "2024-01-01"))
            .await,
        Err(AppError::InvalidAmount(_))
    ));
    assert!(matches!(
        service
            .add_transaction(form("Lunch", "10", "Travel", "2024-01-01"))
            .await,
        Err(AppError::UnknownCategory(_))
    ));
    assert!(matches!(
        service
            .add_transaction(form("Lunch", "10", "Food", "01/02/2024"))
            .await,
        Err(AppError::InvalidDate(_))
    ));

    assert!(service.transactions().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_validation_leaves_storage_untouched() -> Result<()> {
    let (mut service, temp) = test_service().await?;
    SampleLedger::record(&mut service).await?;

    let result = service
        .add_transaction(form("Broken", "abc", "Food", "2024-01-09"))
        .await;
    assert!(result.is_err());
    assert!(result.unwrap_err().is_user_error());

    let reopened = reopen(&temp).await?;
    assert_eq!(reopened.transactions().len(), 4);
    assert_eq!(reopened.summary().balance, 65000);

    Ok(())
}

#[tokio::test]
async fn test_report_from_service() -> Result<()> {
    let mut service = memory_service().await?;
    SampleLedger::record(&mut service).await?;

    let report = service.report(day("2024-01-31"));
    assert_eq!(report.generated_on, day("2024-01-31"));
    assert_eq!(report.balance, 65000);
    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[0].percentage, 71);
    assert_eq!(report.categories[1].percentage, 29);
    assert_eq!(report.recent[0].description, "Bus pass");
    assert_eq!(report.recent.len(), 4);

    let chart = service.expense_chart().unwrap();
    assert_eq!(chart.max, 25000);
    assert_eq!(chart.bars.len(), 2);
    assert_eq!(chart.bars[1].height_percent, 40.0);

    Ok(())
}

#[tokio::test]
async fn test_amounts_at_the_limit() -> Result<()> {
    let mut service = memory_service().await?;

    for _ in 0..3 {
        service
            .add_transaction(form("Windfall", "1000000000000", "Income", "2024-05-01"))
            .await?;
    }
    service
        .add_transaction(form("Mansion", "-1000000000000", "Housing", "2024-05-02"))
        .await?;

    let summary = service.summary();
    assert_eq!(summary.income, 3 * MAX_AMOUNT_CENTS);
    assert_eq!(summary.expense, MAX_AMOUNT_CENTS);
    assert_eq!(summary.balance, 2 * MAX_AMOUNT_CENTS);
    assert!(service.expense_chart().is_some());

    for amount in ["1000000000000.01", "-92233720368547758", "92233720368547758"] {
        assert!(matches!(
            service
                .add_transaction(form("Too much", amount, "Income", "2024-05-03"))
                .await,
            Err(AppError::InvalidAmount(_))
        ));
    }
    assert_eq!(service.transactions().len(), 4);

    Ok(())
}

#[tokio::test]
async fn test_failed_write_leaves_ledger_unchanged() -> Result<()> {
    let store = FlakyStore::default();
    let mut service = BudgetService::load(store.clone()).await?;
    let recorded = SampleLedger::record(&mut service).await?;

    store.fail_writes_to(TRANSACTIONS_KEY);
    assert!(matches!(
        service
            .add_transaction(form("Cinema", "-15", "Entertainment", "2024-01-07"))
            .await,
        Err(AppError::Storage(_))
    ));
    assert!(matches!(
        service.remove_transaction(recorded[0].id).await,
        Err(AppError::Storage(_))
    ));
    assert_eq!(service.transactions(), recorded.as_slice());

    store.heal();
    let reloaded = BudgetService::load(store.inner.clone()).await?;
    assert_eq!(reloaded.transactions(), recorded.as_slice());

    Ok(())
}
