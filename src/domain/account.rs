use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Cents, ValidationError, check_opening_deposit, validate_city, validate_email, validate_name,
    validate_password, validate_phone,
};

pub type AccountId = Uuid;

/// Digits in a generated account number.
pub const ACCOUNT_NUMBER_LEN: usize = 10;

/// External identifier of an account: ten decimal digits, leading zeros allowed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Draw a fresh random number. Uniqueness is the caller's job.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let digits = (0..ACCOUNT_NUMBER_LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self(digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AccountNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AccountNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Personal details collected at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHolder {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub city: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub account_number: AccountNumber,
    pub holder: AccountHolder,
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(account_number: AccountNumber, holder: AccountHolder, balance: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_number,
            holder,
            balance,
            created_at: Utc::now(),
        }
    }
}

/// Everything needed to open an account, before it has a number.
#[derive(Debug, Clone)]
pub struct Registration {
    pub holder: AccountHolder,
    pub password: String,
}

impl Registration {
    /// Checks fields in the order the sign-up form asks for them, with the
    /// opening deposit between password and phone.
    pub fn validate(&self, initial_deposit: Cents) -> Result<(), ValidationError> {
        validate_name(&self.holder.name)?;
        validate_city(&self.holder.city)?;
        validate_password(&self.password)?;
        check_opening_deposit(initial_deposit)?;
        validate_phone(&self.holder.phone)?;
        validate_email(&self.holder.email)?;
        Ok(())
    }
}

/// Partial profile edit; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpdate {
    /// Merge onto `current`, validating the result.
    pub fn apply(self, current: &AccountHolder) -> Result<AccountHolder, ValidationError> {
        let updated = AccountHolder {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            date_of_birth: current.date_of_birth,
            city: self.city.unwrap_or_else(|| current.city.clone()),
            phone: self.phone.unwrap_or_else(|| current.phone.clone()),
            email: self.email.unwrap_or_else(|| current.email.clone()),
        };

        validate_name(&updated.name)?;
        validate_city(&updated.city)?;
        validate_phone(&updated.phone)?;
        validate_email(&updated.email)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::domain::MINIMUM_BALANCE;

    fn holder() -> AccountHolder {
        AccountHolder {
            name: "Ada Lovelace".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            city: "London".into(),
            phone: "9876543210".into(),
            email: "ada@example.com".into(),
        }
    }

    #[test]
    fn test_generated_numbers_are_ten_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let number = AccountNumber::generate(&mut rng);
            assert_eq!(number.as_str().len(), ACCOUNT_NUMBER_LEN);
            assert!(number.as_str().bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_same_seed_replays_numbers() {
        let first = AccountNumber::generate(&mut StdRng::seed_from_u64(3));
        let again = AccountNumber::generate(&mut StdRng::seed_from_u64(3));
        assert_eq!(first, again);
    }

    #[test]
    fn test_registration_checks_deposit_after_password() {
        let registration = Registration {
            holder: AccountHolder {
                phone: "123".into(),
                ..holder()
            },
            password: "weak".into(),
        };
        assert_eq!(
            registration.validate(100),
            Err(ValidationError::PasswordTooShort)
        );

        let registration = Registration {
            holder: AccountHolder {
                phone: "123".into(),
                ..holder()
            },
            password: "Str0ng!pass".into(),
        };
        assert_eq!(
            registration.validate(100),
            Err(ValidationError::BelowMinimumOpening(100))
        );
        assert_eq!(
            registration.validate(MINIMUM_BALANCE),
            Err(ValidationError::InvalidPhone)
        );
    }

    #[test]
    fn test_profile_update_keeps_unset_fields() {
        let current = holder();
        let update = ProfileUpdate {
            city: Some("Paris".into()),
            ..Default::default()
        };

        let updated = update.apply(&current).unwrap();
        assert_eq!(updated.city, "Paris");
        assert_eq!(updated.name, current.name);
        assert_eq!(updated.email, current.email);
    }

    #[test]
    fn test_profile_update_rejects_bad_email() {
        let update = ProfileUpdate {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(matches!(
            update.apply(&holder()),
            Err(ValidationError::InvalidEmail(_))
        ));
    }
}
