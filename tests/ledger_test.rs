mod common;

use anyhow::Result;
use bankbook::application::{LedgerError, LedgerService};
use bankbook::domain::{MovementType, ValidationError};
use common::{open, open_and_login, registration, test_service};

#[tokio::test]
async fn test_open_account_with_minimum_deposit() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = open(&service, "Asha Rao", 200_000).await?;
    assert_eq!(account.account_number.as_str().len(), 10);
    assert_eq!(service.get_balance(&account).await?, 200_000);

    // The opening deposit is not a movement
    assert!(service.get_history(&account).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_open_account_below_minimum_creates_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .open_account(registration("Asha Rao"), 100_000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::BelowMinimumOpening(100_000))
    ));
    assert!(service.list_accounts().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_open_account_rejects_invalid_fields() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let mut bad_name = registration("Asha Rao");
    bad_name.holder.name = "R2D2".into();
    assert!(matches!(
        service.open_account(bad_name, 300_000).await,
        Err(LedgerError::Validation(ValidationError::InvalidName))
    ));

    let mut bad_phone = registration("Asha Rao");
    bad_phone.holder.phone = "12345".into();
    assert!(matches!(
        service.open_account(bad_phone, 300_000).await,
        Err(LedgerError::Validation(ValidationError::InvalidPhone))
    ));

    let mut weak = registration("Asha Rao");
    weak.password = "password".into();
    assert!(matches!(
        service.open_account(weak, 300_000).await,
        Err(LedgerError::Validation(_))
    ));

    assert!(service.list_accounts().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_deposit_then_withdraw_round_trip() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut session = open_and_login(&service, "Asha Rao", 500_000).await?;

    let balance = service.deposit(&mut session.account, 25_050).await?;
    assert_eq!(balance, 525_050);
    assert_eq!(session.account.balance, 525_050);

    let balance = service.withdraw(&mut session.account, 25_050).await?;
    assert_eq!(balance, 500_000);
    assert_eq!(service.get_balance(&session.account).await?, 500_000);

    let history = service.get_history(&session.account).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].movement_type, MovementType::Credit);
    assert_eq!(history[1].movement_type, MovementType::Debit);
    assert!(history[0].sequence < history[1].sequence);

    Ok(())
}

#[tokio::test]
async fn test_non_positive_amounts_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut session = open_and_login(&service, "Asha Rao", 500_000).await?;

    for amount in [0, -100] {
        assert!(matches!(
            service.deposit(&mut session.account, amount).await,
            Err(LedgerError::Validation(ValidationError::NonPositiveAmount(_)))
        ));
        assert!(matches!(
            service.withdraw(&mut session.account, amount).await,
            Err(LedgerError::Validation(ValidationError::NonPositiveAmount(_)))
        ));
    }

    assert_eq!(service.get_balance(&session.account).await?, 500_000);
    assert!(service.get_history(&session.account).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_withdraw_more_than_balance_is_insufficient_funds() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut session = open_and_login(&service, "Asha Rao", 500_000).await?;

    let err = service
        .withdraw(&mut session.account, 1_000_000)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientFunds {
            balance: 500_000,
            requested: 1_000_000
        }
    ));
    assert_eq!(session.account.balance, 500_000);

    Ok(())
}

#[tokio::test]
async fn test_withdraw_below_floor_is_minimum_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut session = open_and_login(&service, "Asha Rao", 500_000).await?;

    // 5000 - 3000.01 would leave 1999.99
    let err = service
        .withdraw(&mut session.account, 300_001)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MinimumBalance { .. }));

    // Exactly down to the floor is allowed
    assert_eq!(service.withdraw(&mut session.account, 300_000).await?, 200_000);
    assert_eq!(service.get_history(&session.account).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_history_survives_reconnect() -> Result<()> {
    let (service, temp) = test_service().await?;
    let mut session = open_and_login(&service, "Asha Rao", 500_000).await?;

    service.deposit(&mut session.account, 10_000).await?;
    service.withdraw(&mut session.account, 5_000).await?;
    service.deposit(&mut session.account, 1_000).await?;
    let account = session.account.clone();
    service.logout(session).await?;
    drop(service);

    let db_path = temp.path().join("test.db");
    let reopened = LedgerService::connect(db_path.to_str().unwrap()).await?;

    let history = reopened.get_history(&account).await?;
    let kinds: Vec<_> = history.iter().map(|m| m.movement_type).collect();
    assert_eq!(
        kinds,
        vec![MovementType::Credit, MovementType::Debit, MovementType::Credit]
    );
    assert!(history.windows(2).all(|w| w[0].sequence < w[1].sequence));
    assert_eq!(reopened.get_balance(&account).await?, 506_000);

    Ok(())
}
