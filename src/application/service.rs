use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::domain::{
    Account, AccountNumber, Cents, LoginSession, MINIMUM_BALANCE, MovementRecord, ProfileUpdate,
    Registration, ValidationError, check_debit, check_deposit, check_transfer_target,
    format_cents, validate_password,
};
use crate::storage::Repository;

use super::LedgerError;

/// How many fresh account numbers to try before giving up on a collision streak.
pub const ACCOUNT_NUMBER_ATTEMPTS: usize = 32;

/// The ledger: owns the account store and enforces the balance rules.
/// This is the primary interface for any client (CLI, tests, etc.).
pub struct LedgerService {
    repo: Repository,
    rng: Mutex<StdRng>,
}

/// An authenticated holder. The caller keeps it and passes `&mut session.account`
/// to balance-changing operations.
#[derive(Debug, Clone)]
pub struct Session {
    pub login: LoginSession,
    pub account: Account,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Make account number generation reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Accounts
    // ========================

    /// Open an account funded with `initial_deposit`. The opening deposit is
    /// not recorded as a movement.
    pub async fn open_account(
        &self,
        registration: Registration,
        initial_deposit: Cents,
    ) -> Result<Account, LedgerError> {
        registration.validate(initial_deposit)?;

        let account_number = self.unique_account_number().await?;
        let account = Account::new(account_number, registration.holder, initial_deposit);
        self.repo
            .save_account(&account, &registration.password)
            .await?;

        info!(
            account_number = %account.account_number,
            balance = %format_cents(account.balance),
            "account opened"
        );
        Ok(account)
    }

    async fn unique_account_number(&self) -> Result<AccountNumber, LedgerError> {
        for attempt in 1..=ACCOUNT_NUMBER_ATTEMPTS {
            let candidate = {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                AccountNumber::generate(&mut *rng)
            };
            if !self.repo.account_number_exists(&candidate).await? {
                return Ok(candidate);
            }
            debug!(attempt, account_number = %candidate, "account number taken, regenerating");
        }
        Err(LedgerError::DuplicateAccount {
            attempts: ACCOUNT_NUMBER_ATTEMPTS,
        })
    }

    pub async fn find_account(&self, number: &AccountNumber) -> Result<Account, LedgerError> {
        self.repo
            .get_account(number)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(number))
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.repo.list_accounts().await?)
    }

    // ========================
    // Money movements
    // ========================

    /// Credit the account. Returns the new balance and refreshes `account`.
    pub async fn deposit(&self, account: &mut Account, amount: Cents) -> Result<Cents, LedgerError> {
        let number = account.account_number.clone();
        let mut tx = self.repo.begin().await?;

        let balance = Self::stored_balance(&mut tx, &number).await?;
        let new_balance = check_deposit(balance, amount)?;
        Self::credit_row(&mut tx, &number, amount).await?;

        let mut movement = MovementRecord::credit(number.clone(), amount);
        Repository::insert_movement(&mut tx, &mut movement).await?;
        tx.commit().await.context("Failed to commit deposit")?;

        account.balance = new_balance;
        info!(account_number = %number, amount = %format_cents(amount), "deposit recorded");
        Ok(new_balance)
    }

    /// Debit the account. Rejections are reported in order: non-positive
    /// amount, insufficient funds, minimum balance.
    pub async fn withdraw(&self, account: &mut Account, amount: Cents) -> Result<Cents, LedgerError> {
        let number = account.account_number.clone();
        let mut tx = self.repo.begin().await?;

        let balance = Self::stored_balance(&mut tx, &number).await?;
        let new_balance = check_debit(balance, amount)?;
        Self::debit_row(&mut tx, &number, balance, amount).await?;

        let mut movement = MovementRecord::debit(number.clone(), amount);
        Repository::insert_movement(&mut tx, &mut movement).await?;
        tx.commit().await.context("Failed to commit withdrawal")?;

        account.balance = new_balance;
        info!(account_number = %number, amount = %format_cents(amount), "withdrawal recorded");
        Ok(new_balance)
    }

    /// Move money to another account as one unit: both balances change and one
    /// TRANSFER movement is written for the sender, or nothing changes at all.
    ///
    /// Rejections are reported in order: unknown receiver, self transfer,
    /// non-positive amount, insufficient funds, minimum balance.
    pub async fn transfer(
        &self,
        from: &mut Account,
        to: &AccountNumber,
        amount: Cents,
    ) -> Result<Cents, LedgerError> {
        let sender = from.account_number.clone();
        let mut tx = self.repo.begin().await?;

        let receiver_balance = Repository::fetch_balance(&mut tx, to)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(to))?;
        check_transfer_target(&sender, to)?;

        let balance = Self::stored_balance(&mut tx, &sender).await?;
        let new_balance = check_debit(balance, amount)?;
        check_deposit(receiver_balance, amount)?;

        // Rows are written in ascending account-number order.
        if sender < *to {
            Self::debit_row(&mut tx, &sender, balance, amount).await?;
            Self::credit_row(&mut tx, to, amount).await?;
        } else {
            Self::credit_row(&mut tx, to, amount).await?;
            Self::debit_row(&mut tx, &sender, balance, amount).await?;
        }

        let mut movement = MovementRecord::transfer(sender.clone(), to.clone(), amount);
        Repository::insert_movement(&mut tx, &mut movement).await?;
        tx.commit().await.context("Failed to commit transfer")?;

        from.balance = new_balance;
        info!(
            from = %sender,
            to = %to,
            amount = %format_cents(amount),
            "transfer recorded"
        );
        Ok(new_balance)
    }

    async fn stored_balance(
        conn: &mut SqliteConnection,
        number: &AccountNumber,
    ) -> Result<Cents, LedgerError> {
        Repository::fetch_balance(conn, number)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(number))
    }

    async fn credit_row(
        conn: &mut SqliteConnection,
        number: &AccountNumber,
        amount: Cents,
    ) -> Result<(), LedgerError> {
        if !Repository::credit(conn, number, amount).await? {
            return Err(LedgerError::account_not_found(number));
        }
        Ok(())
    }

    /// The floor is enforced again by the UPDATE itself.
    async fn debit_row(
        conn: &mut SqliteConnection,
        number: &AccountNumber,
        balance: Cents,
        amount: Cents,
    ) -> Result<(), LedgerError> {
        if !Repository::debit_above(conn, number, amount, MINIMUM_BALANCE).await? {
            return Err(LedgerError::MinimumBalance {
                balance,
                requested: amount,
                minimum: MINIMUM_BALANCE,
            });
        }
        Ok(())
    }

    // ========================
    // Queries
    // ========================

    /// Current stored balance of the account.
    pub async fn get_balance(&self, account: &Account) -> Result<Cents, LedgerError> {
        self.repo
            .get_balance(&account.account_number)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(&account.account_number))
    }

    /// Movements of the account, oldest first. Each call reads the history afresh.
    pub async fn get_history(&self, account: &Account) -> Result<Vec<MovementRecord>, LedgerError> {
        Ok(self.repo.list_movements(&account.account_number).await?)
    }

    // ========================
    // Authentication and profile
    // ========================

    /// Check credentials and record a login.
    pub async fn authenticate(
        &self,
        number: &AccountNumber,
        password: &str,
    ) -> Result<Session, LedgerError> {
        let stored = self.repo.get_password(number).await?;
        if stored.as_deref() != Some(password) {
            warn!(account_number = %number, "authentication failed");
            return Err(LedgerError::AuthenticationFailed);
        }

        let account = self.find_account(number).await?;
        let login = self.repo.start_session(number).await?;
        info!(account_number = %number, session = login.id, "logged in");
        Ok(Session { login, account })
    }

    /// Close every open login of the session's account.
    pub async fn logout(&self, session: Session) -> Result<(), LedgerError> {
        let closed = self
            .repo
            .end_sessions(&session.account.account_number)
            .await?;
        info!(account_number = %session.account.account_number, closed, "logged out");
        Ok(())
    }

    pub async fn login_history(&self, account: &Account) -> Result<Vec<LoginSession>, LedgerError> {
        Ok(self.repo.list_sessions(&account.account_number).await?)
    }

    pub async fn change_password(
        &self,
        account: &Account,
        current: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<(), LedgerError> {
        let stored = self.repo.get_password(&account.account_number).await?;
        if stored.as_deref() != Some(current) {
            warn!(account_number = %account.account_number, "password change refused");
            return Err(LedgerError::AuthenticationFailed);
        }
        validate_password(new_password)?;
        if new_password != confirmation {
            return Err(ValidationError::PasswordMismatch.into());
        }

        self.repo
            .update_password(&account.account_number, new_password)
            .await?;
        info!(account_number = %account.account_number, "password changed");
        Ok(())
    }

    /// Apply a partial profile edit and refresh `account.holder`.
    pub async fn update_profile(
        &self,
        account: &mut Account,
        update: ProfileUpdate,
    ) -> Result<(), LedgerError> {
        let holder = update.apply(&account.holder)?;
        self.repo
            .update_holder(&account.account_number, &holder)
            .await?;
        account.holder = holder;
        info!(account_number = %account.account_number, "profile updated");
        Ok(())
    }
}
