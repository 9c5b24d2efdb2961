use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountNumber, Cents};

pub type MovementId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Money paid into the account
    Credit,
    /// Money taken out of the account
    Debit,
    /// Money sent to another account
    Transfer,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Credit => "CREDIT",
            MovementType::Debit => "DEBIT",
            MovementType::Transfer => "TRANSFER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CREDIT" => Some(MovementType::Credit),
            "DEBIT" => Some(MovementType::Debit),
            "TRANSFER" => Some(MovementType::Transfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit entry written once per successful balance change.
/// The opening deposit of an account never produces one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: MovementId,
    /// Assigned by the store; orders an account's history
    pub sequence: i64,
    pub account_number: AccountNumber,
    pub movement_type: MovementType,
    /// Always positive
    pub amount: Cents,
    /// Receiving account, only set on transfers
    pub counterparty: Option<AccountNumber>,
    pub timestamp: DateTime<Utc>,
}

impl MovementRecord {
    pub fn credit(account_number: AccountNumber, amount: Cents) -> Self {
        Self::new(account_number, MovementType::Credit, amount, None)
    }

    pub fn debit(account_number: AccountNumber, amount: Cents) -> Self {
        Self::new(account_number, MovementType::Debit, amount, None)
    }

    pub fn transfer(from: AccountNumber, to: AccountNumber, amount: Cents) -> Self {
        Self::new(from, MovementType::Transfer, amount, Some(to))
    }

    fn new(
        account_number: AccountNumber,
        movement_type: MovementType,
        amount: Cents,
        counterparty: Option<AccountNumber>,
    ) -> Self {
        assert!(amount > 0, "Movement amount must be positive");
        Self {
            id: Uuid::new_v4(),
            sequence: 0, // Will be set by repository
            account_number,
            movement_type,
            amount,
            counterparty,
            timestamp: Utc::now(),
        }
    }
}
