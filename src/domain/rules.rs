use thiserror::Error;

use super::{AccountNumber, Cents, MINIMUM_BALANCE, ValidationError, display_cents};

/// A business rule that refused a balance change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Not enough money: balance {}, requested {}", display_cents(.balance), display_cents(.requested))]
    InsufficientFunds { balance: Cents, requested: Cents },

    #[error("Balance cannot drop below {}: balance {}, requested {}", display_cents(.minimum), display_cents(.balance), display_cents(.requested))]
    MinimumBalance {
        balance: Cents,
        requested: Cents,
        minimum: Cents,
    },

    #[error("Cannot send money to your own account {0}")]
    SelfTransfer(AccountNumber),
}

pub fn check_opening_deposit(amount: Cents) -> Result<(), ValidationError> {
    if amount < MINIMUM_BALANCE {
        return Err(ValidationError::BelowMinimumOpening(amount));
    }
    Ok(())
}

fn check_positive(amount: Cents) -> Result<(), ValidationError> {
    if amount <= 0 {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    Ok(())
}

/// Returns the balance after crediting `amount`.
pub fn check_deposit(balance: Cents, amount: Cents) -> Result<Cents, ValidationError> {
    check_positive(amount)?;
    balance
        .checked_add(amount)
        .ok_or(ValidationError::AmountOverflow)
}

/// Returns the balance after debiting `amount`. Checks run in a fixed order:
/// positivity, then sufficiency, then the minimum-balance floor.
pub fn check_debit(balance: Cents, amount: Cents) -> Result<Cents, RuleViolation> {
    check_positive(amount)?;
    if amount > balance {
        return Err(RuleViolation::InsufficientFunds {
            balance,
            requested: amount,
        });
    }
    let remaining = balance - amount;
    if remaining < MINIMUM_BALANCE {
        return Err(RuleViolation::MinimumBalance {
            balance,
            requested: amount,
            minimum: MINIMUM_BALANCE,
        });
    }
    Ok(remaining)
}

/// Refuses transfers back into the sending account.
pub fn check_transfer_target(
    from: &AccountNumber,
    to: &AccountNumber,
) -> Result<(), RuleViolation> {
    if from == to {
        return Err(RuleViolation::SelfTransfer(to.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_deposit_floor() {
        assert!(check_opening_deposit(MINIMUM_BALANCE).is_ok());
        assert_eq!(
            check_opening_deposit(100_000),
            Err(ValidationError::BelowMinimumOpening(100_000))
        );
    }

    #[test]
    fn test_deposit() {
        assert_eq!(check_deposit(500_000, 2_500), Ok(502_500));
        assert_eq!(
            check_deposit(500_000, 0),
            Err(ValidationError::NonPositiveAmount(0))
        );
        assert_eq!(
            check_deposit(500_000, -10),
            Err(ValidationError::NonPositiveAmount(-10))
        );
        assert_eq!(
            check_deposit(Cents::MAX, 1),
            Err(ValidationError::AmountOverflow)
        );
    }

    #[test]
    fn test_debit_success_down_to_floor() {
        assert_eq!(check_debit(500_000, 300_000), Ok(MINIMUM_BALANCE));
    }

    #[test]
    fn test_debit_insufficient_before_floor() {
        // Both rules fail; sufficiency is reported first.
        assert_eq!(
            check_debit(500_000, 1_000_000),
            Err(RuleViolation::InsufficientFunds {
                balance: 500_000,
                requested: 1_000_000,
            })
        );
    }

    #[test]
    fn test_debit_positivity_first() {
        assert_eq!(
            check_debit(100, -5),
            Err(RuleViolation::Validation(ValidationError::NonPositiveAmount(
                -5
            )))
        );
    }

    #[test]
    fn test_debit_floor() {
        assert_eq!(
            check_debit(500_000, 300_001),
            Err(RuleViolation::MinimumBalance {
                balance: 500_000,
                requested: 300_001,
                minimum: MINIMUM_BALANCE,
            })
        );
    }

    #[test]
    fn test_self_transfer() {
        let a = AccountNumber::from("0123456789");
        let b = AccountNumber::from("9876543210");
        assert!(check_transfer_target(&a, &b).is_ok());
        assert_eq!(
            check_transfer_target(&a, &a),
            Err(RuleViolation::SelfTransfer(a.clone()))
        );
    }
}
