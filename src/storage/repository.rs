use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{
    Account, AccountHolder, AccountNumber, Cents, LoginSession, MovementRecord, MovementType,
};

use super::{MIGRATION_001_ACCOUNTS, MIGRATION_002_QUIZZES};

const ACCOUNT_COLUMNS: &str =
    "id, account_number, name, date_of_birth, city, phone, email, balance, created_at";

const MOVEMENT_COLUMNS: &str =
    "sequence, id, account_number, movement_type, amount, counterparty, timestamp";

/// SQLite persistence for accounts, their movements and login sessions.
///
/// Balance-changing writes are associated functions over a `SqliteConnection`
/// so the service can group them inside one transaction from [`Repository::begin`].
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL such as `sqlite:bank.db?mode=rwc`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create tables and seed quiz content. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_ACCOUNTS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_QUIZZES)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Start a transaction. Dropping it without `commit` rolls everything back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .context("Failed to start transaction")
    }

    // ========================
    // Account operations
    // ========================

    pub async fn save_account(&self, account: &Account, password: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, account_number, name, date_of_birth, city, phone, email, password, balance, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(account.account_number.as_str())
        .bind(&account.holder.name)
        .bind(account.holder.date_of_birth.format("%Y-%m-%d").to_string())
        .bind(&account.holder.city)
        .bind(&account.holder.phone)
        .bind(&account.holder.email)
        .bind(password)
        .bind(account.balance)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    pub async fn account_number_exists(&self, number: &AccountNumber) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM accounts WHERE account_number = ?")
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up account number")?;
        Ok(row.is_some())
    }

    pub async fn get_account(&self, number: &AccountNumber) -> Result<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_number = ?");
        let row = sqlx::query(&query)
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// Every account, oldest first.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at, account_number");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    pub async fn get_password(&self, number: &AccountNumber) -> Result<Option<String>> {
        let row = sqlx::query("SELECT password FROM accounts WHERE account_number = ?")
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch password")?;
        Ok(row.map(|r| r.get("password")))
    }

    pub async fn update_password(&self, number: &AccountNumber, password: &str) -> Result<()> {
        sqlx::query("UPDATE accounts SET password = ? WHERE account_number = ?")
            .bind(password)
            .bind(number.as_str())
            .execute(&self.pool)
            .await
            .context("Failed to update password")?;
        Ok(())
    }

    pub async fn update_holder(&self, number: &AccountNumber, holder: &AccountHolder) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET name = ?, city = ?, phone = ?, email = ?
            WHERE account_number = ?
            "#,
        )
        .bind(&holder.name)
        .bind(&holder.city)
        .bind(&holder.phone)
        .bind(&holder.email)
        .bind(number.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to update account holder")?;
        Ok(())
    }

    pub async fn get_balance(&self, number: &AccountNumber) -> Result<Option<Cents>> {
        let row = sqlx::query("SELECT balance FROM accounts WHERE account_number = ?")
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch balance")?;
        Ok(row.map(|r| r.get("balance")))
    }

    fn row_to_account(row: &SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let number: String = row.get("account_number");
        let dob_str: String = row.get("date_of_birth");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            account_number: AccountNumber::from(number),
            holder: AccountHolder {
                name: row.get("name"),
                date_of_birth: NaiveDate::parse_from_str(&dob_str, "%Y-%m-%d")
                    .context("Invalid date of birth")?,
                city: row.get("city"),
                phone: row.get("phone"),
                email: row.get("email"),
            },
            balance: row.get("balance"),
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at")?,
        })
    }

    // ========================
    // Transactional balance writes
    // ========================

    /// Read a balance inside an open transaction.
    pub async fn fetch_balance(
        conn: &mut SqliteConnection,
        number: &AccountNumber,
    ) -> Result<Option<Cents>> {
        let row = sqlx::query("SELECT balance FROM accounts WHERE account_number = ?")
            .bind(number.as_str())
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to fetch balance")?;
        Ok(row.map(|r| r.get("balance")))
    }

    /// Add `amount` to a balance. Returns false if the account does not exist.
    pub async fn credit(
        conn: &mut SqliteConnection,
        number: &AccountNumber,
        amount: Cents,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET balance = balance + ? WHERE account_number = ?")
            .bind(amount)
            .bind(number.as_str())
            .execute(&mut *conn)
            .await
            .context("Failed to credit account")?;
        Ok(result.rows_affected() == 1)
    }

    /// Subtract `amount` only if the balance stays at or above `floor`.
    /// Returns false when the guard refuses the write.
    pub async fn debit_above(
        conn: &mut SqliteConnection,
        number: &AccountNumber,
        amount: Cents,
        floor: Cents,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance - ?1
            WHERE account_number = ?2 AND balance - ?1 >= ?3
            "#,
        )
        .bind(amount)
        .bind(number.as_str())
        .bind(floor)
        .execute(&mut *conn)
        .await
        .context("Failed to debit account")?;
        Ok(result.rows_affected() == 1)
    }

    /// Append a movement and fill in its store-assigned sequence.
    pub async fn insert_movement(
        conn: &mut SqliteConnection,
        movement: &mut MovementRecord,
    ) -> Result<()> {
        let row = sqlx::query(
            r#"
            INSERT INTO movements (id, account_number, movement_type, amount, counterparty, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING sequence
            "#,
        )
        .bind(movement.id.to_string())
        .bind(movement.account_number.as_str())
        .bind(movement.movement_type.as_str())
        .bind(movement.amount)
        .bind(movement.counterparty.as_ref().map(AccountNumber::as_str))
        .bind(movement.timestamp.to_rfc3339())
        .fetch_one(&mut *conn)
        .await
        .context("Failed to save movement")?;

        movement.sequence = row.get("sequence");
        Ok(())
    }

    // ========================
    // Movement queries
    // ========================

    /// Movements recorded against an account, oldest first.
    pub async fn list_movements(&self, number: &AccountNumber) -> Result<Vec<MovementRecord>> {
        let query = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE account_number = ? ORDER BY sequence"
        );
        let rows = sqlx::query(&query)
            .bind(number.as_str())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list movements")?;

        rows.iter().map(Self::row_to_movement).collect()
    }

    fn row_to_movement(row: &SqliteRow) -> Result<MovementRecord> {
        let id_str: String = row.get("id");
        let number: String = row.get("account_number");
        let type_str: String = row.get("movement_type");
        let counterparty: Option<String> = row.get("counterparty");
        let timestamp_str: String = row.get("timestamp");

        Ok(MovementRecord {
            id: Uuid::parse_str(&id_str).context("Invalid movement ID")?,
            sequence: row.get("sequence"),
            account_number: AccountNumber::from(number),
            movement_type: MovementType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid movement type: {}", type_str))?,
            amount: row.get("amount"),
            counterparty: counterparty.map(AccountNumber::from),
            timestamp: parse_timestamp(&timestamp_str).context("Invalid movement timestamp")?,
        })
    }

    // ========================
    // Login sessions
    // ========================

    pub async fn start_session(&self, number: &AccountNumber) -> Result<LoginSession> {
        let login_at = Utc::now();
        let row = sqlx::query(
            "INSERT INTO login_sessions (account_number, login_at) VALUES (?, ?) RETURNING id",
        )
        .bind(number.as_str())
        .bind(login_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to record login")?;

        Ok(LoginSession {
            id: row.get("id"),
            account_number: number.clone(),
            login_at,
            logout_at: None,
        })
    }

    /// Stamp a logout time on every open session of the account.
    pub async fn end_sessions(&self, number: &AccountNumber) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE login_sessions
            SET logout_at = ?
            WHERE account_number = ? AND logout_at IS NULL
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(number.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to record logout")?;
        Ok(result.rows_affected())
    }

    pub async fn list_sessions(&self, number: &AccountNumber) -> Result<Vec<LoginSession>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_number, login_at, logout_at
            FROM login_sessions
            WHERE account_number = ?
            ORDER BY id
            "#,
        )
        .bind(number.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list login sessions")?;

        rows.iter().map(Self::row_to_session).collect()
    }

    fn row_to_session(row: &SqliteRow) -> Result<LoginSession> {
        let number: String = row.get("account_number");
        let login_at: String = row.get("login_at");
        let logout_at: Option<String> = row.get("logout_at");

        Ok(LoginSession {
            id: row.get("id"),
            account_number: AccountNumber::from(number),
            login_at: parse_timestamp(&login_at).context("Invalid login_at")?,
            logout_at: logout_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()
                .context("Invalid logout_at")?,
        })
    }
}

pub(super) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
