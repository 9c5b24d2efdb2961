use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Account, Cents, MovementRecord, format_cents};

/// Point-in-time view of one account and its full history.
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub account: Account,
    pub balance: Cents,
    pub movements: Vec<MovementRecord>,
}

/// Writes ledger data out as CSV or JSON.
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// One CSV row per movement of `account`, oldest first.
    pub async fn export_history_csv<W: Write>(&self, account: &Account, writer: W) -> Result<usize> {
        let movements = self.service.get_history(account).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["sequence", "timestamp", "type", "amount", "counterparty"])?;

        for movement in &movements {
            csv_writer.write_record([
                movement.sequence.to_string(),
                movement.timestamp.to_rfc3339(),
                movement.movement_type.to_string(),
                format_cents(movement.amount),
                movement
                    .counterparty
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(movements.len())
    }

    /// One CSV row per account with its holder details and balance.
    pub async fn export_accounts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let accounts = self.service.list_accounts().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["account_number", "name", "city", "phone", "email", "balance"])?;

        for account in &accounts {
            csv_writer.write_record([
                account.account_number.as_str(),
                account.holder.name.as_str(),
                account.holder.city.as_str(),
                account.holder.phone.as_str(),
                account.holder.email.as_str(),
                format_cents(account.balance).as_str(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(accounts.len())
    }

    /// Pretty-printed JSON statement for `account`.
    pub async fn export_statement_json<W: Write>(
        &self,
        account: &Account,
        mut writer: W,
    ) -> Result<Statement> {
        let balance = self.service.get_balance(account).await?;
        let movements = self.service.get_history(account).await?;

        let statement = Statement {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            account: Account {
                balance,
                ..account.clone()
            },
            balance,
            movements,
        };

        let json = serde_json::to_string_pretty(&statement)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(statement)
    }
}
