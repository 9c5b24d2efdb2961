mod common;

use std::collections::HashSet;

use anyhow::Result;
use bankbook::application::LedgerError;
use bankbook::domain::{AccountNumber, ProfileUpdate, ValidationError};
use common::{PASSWORD, open, open_and_login, test_service};

#[tokio::test]
async fn test_account_numbers_are_distinct() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let mut numbers = HashSet::new();
    for _ in 0..10_000 {
        let account = open(&service, "Asha Rao", 200_000).await?;
        assert_eq!(account.account_number.as_str().len(), 10);
        assert!(numbers.insert(account.account_number));
    }

    assert_eq!(numbers.len(), 10_000);
    assert_eq!(service.list_accounts().await?.len(), 10_000);
    Ok(())
}

#[tokio::test]
async fn test_authenticate_and_logout_record_sessions() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = open(&service, "Asha Rao", 300_000).await?;

    let session = service
        .authenticate(&account.account_number, PASSWORD)
        .await?;
    assert_eq!(session.account.account_number, account.account_number);
    assert!(session.login.is_open());

    service.logout(session).await?;

    let logins = service.login_history(&account).await?;
    assert_eq!(logins.len(), 1);
    assert!(!logins[0].is_open());

    Ok(())
}

#[tokio::test]
async fn test_authenticate_rejects_wrong_credentials() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = open(&service, "Asha Rao", 300_000).await?;

    assert!(matches!(
        service
            .authenticate(&account.account_number, "Wrong#pass1")
            .await,
        Err(LedgerError::AuthenticationFailed)
    ));
    assert!(matches!(
        service
            .authenticate(&AccountNumber::from("1234567890"), PASSWORD)
            .await,
        Err(LedgerError::AuthenticationFailed)
    ));
    assert!(service.login_history(&account).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_change_password() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = open_and_login(&service, "Asha Rao", 300_000).await?;
    let account = session.account.clone();

    assert!(matches!(
        service
            .change_password(&account, PASSWORD, "N3w#secret", "N3w#secrex")
            .await,
        Err(LedgerError::Validation(ValidationError::PasswordMismatch))
    ));
    assert!(matches!(
        service
            .change_password(&account, "Not#mine1", "N3w#secret", "N3w#secret")
            .await,
        Err(LedgerError::AuthenticationFailed)
    ));

    service
        .change_password(&account, PASSWORD, "N3w#secret", "N3w#secret")
        .await?;
    service.logout(session).await?;

    assert!(
        service
            .authenticate(&account.account_number, PASSWORD)
            .await
            .is_err()
    );
    service
        .authenticate(&account.account_number, "N3w#secret")
        .await?;

    Ok(())
}

#[tokio::test]
async fn test_update_profile() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut session = open_and_login(&service, "Asha Rao", 300_000).await?;

    let update = ProfileUpdate {
        city: Some("Mumbai".into()),
        email: Some("asha@bank.example".into()),
        ..Default::default()
    };
    service.update_profile(&mut session.account, update).await?;
    assert_eq!(session.account.holder.city, "Mumbai");

    let stored = service
        .find_account(&session.account.account_number)
        .await?;
    assert_eq!(stored.holder.city, "Mumbai");
    assert_eq!(stored.holder.email, "asha@bank.example");
    assert_eq!(stored.holder.name, "Asha Rao");

    let bad = ProfileUpdate {
        phone: Some("12".into()),
        ..Default::default()
    };
    assert!(service.update_profile(&mut session.account, bad).await.is_err());
    assert_eq!(session.account.holder.phone, "9123456780");

    Ok(())
}
