use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AccountNumber;

/// One recorded login of an account holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSession {
    pub id: i64,
    pub account_number: AccountNumber,
    pub login_at: DateTime<Utc>,
    pub logout_at: Option<DateTime<Utc>>,
}

impl LoginSession {
    pub fn is_open(&self) -> bool {
        self.logout_at.is_none()
    }
}
