use std::fs::File;
use std::io::{BufRead, Write, stdin, stdout};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::application::{LedgerService, QuizService, Session};
use crate::domain::{
    AccountHolder, AccountNumber, Cents, ProfileUpdate, Quiz, QuizUser, Registration,
    format_cents, parse_cents,
};
use crate::io::Exporter;

/// Bankbook - accounts, transfers and quizzes over a local SQLite file
#[derive(Parser)]
#[command(name = "bankbook")]
#[command(about = "A small banking ledger and quiz tracker for the command line")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BANKBOOK_DB", default_value = "bankbook.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Account number and password of the holder running the command.
#[derive(Args)]
pub struct Credentials {
    /// Account number
    #[arg(short, long)]
    pub account: String,

    /// Account password
    #[arg(short, long, env = "BANKBOOK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Open a new account (minimum opening deposit 2000)
    Open {
        /// Full name (letters and spaces)
        #[arg(long)]
        name: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: String,

        #[arg(long)]
        city: String,

        /// 10-digit phone number
        #[arg(long)]
        phone: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "BANKBOOK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Opening deposit (e.g., "2500" or "2500.00")
        #[arg(long)]
        deposit: String,
    },

    /// List all accounts
    Accounts,

    /// Show the balance of your account
    Balance {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Add money to your account
    Deposit {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Take money out of your account
    Withdraw {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Send money to another account
    Transfer {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Receiving account number
        #[arg(long)]
        to: String,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Show the movements of your account
    History {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Show recorded logins of your account
    Logins {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Change your password
    Password {
        #[command(flatten)]
        credentials: Credentials,

        /// New password
        #[arg(long)]
        new: String,

        /// New password again
        #[arg(long)]
        confirm: String,
    },

    /// Update your personal details (omitted fields are kept)
    Profile {
        #[command(flatten)]
        credentials: Credentials,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export
        #[arg(value_enum)]
        kind: ExportKind,

        /// Account number (required for history and statement)
        #[arg(short, long)]
        account: Option<String>,

        /// Account password (required for history and statement)
        #[arg(short, long, env = "BANKBOOK_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Quiz commands
    #[command(subcommand)]
    Quiz(QuizCommands),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportKind {
    /// Movements of one account as CSV
    History,
    /// All accounts as CSV
    Accounts,
    /// One account with balance and movements as JSON
    Statement,
}

#[derive(Subcommand)]
pub enum QuizCommands {
    /// Register for quizzes
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BANKBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List available quizzes
    List,

    /// Take a quiz
    Take {
        /// Quiz name (e.g., "Math Quiz")
        quiz: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BANKBOOK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Comma-separated option numbers; prompts on stdin when omitted
        #[arg(long)]
        answers: Option<String>,
    },

    /// Show your quiz scores
    Results {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BANKBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Open {
                name,
                dob,
                city,
                phone,
                email,
                password,
                deposit,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let registration = Registration {
                    holder: AccountHolder {
                        name,
                        date_of_birth: parse_date(&dob)?,
                        city,
                        phone,
                        email,
                    },
                    password,
                };
                let account = service
                    .open_account(registration, parse_amount(&deposit)?)
                    .await?;

                println!("Welcome aboard, {}!", account.holder.name);
                println!("Your account number is: {}", account.account_number);
            }

            Commands::Accounts => {
                let service = LedgerService::connect(&self.database).await?;
                run_accounts_command(&service).await?;
            }

            Commands::Balance { credentials } => {
                let service = LedgerService::connect(&self.database).await?;
                let session = login(&service, &credentials).await?;
                let balance = service.get_balance(&session.account).await;
                service.logout(session).await?;
                println!("You have: {}", format_cents(balance?));
            }

            Commands::Deposit {
                amount,
                credentials,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount = parse_amount(&amount)?;
                let mut session = login(&service, &credentials).await?;
                let outcome = service.deposit(&mut session.account, amount).await;
                service.logout(session).await?;

                let balance = outcome?;
                println!("Added {}", format_cents(amount));
                println!("New balance: {}", format_cents(balance));
            }

            Commands::Withdraw {
                amount,
                credentials,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount = parse_amount(&amount)?;
                let mut session = login(&service, &credentials).await?;
                let outcome = service.withdraw(&mut session.account, amount).await;
                service.logout(session).await?;

                let balance = outcome?;
                println!("Withdrew {}", format_cents(amount));
                println!("New balance: {}", format_cents(balance));
            }

            Commands::Transfer {
                amount,
                to,
                credentials,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount = parse_amount(&amount)?;
                let to = AccountNumber::from(to.trim());
                let mut session = login(&service, &credentials).await?;
                let outcome = service.transfer(&mut session.account, &to, amount).await;
                service.logout(session).await?;

                let balance = outcome?;
                println!("Sent {} to account {}", format_cents(amount), to);
                println!("New balance: {}", format_cents(balance));
            }

            Commands::History { credentials } => {
                let service = LedgerService::connect(&self.database).await?;
                let session = login(&service, &credentials).await?;
                let outcome = run_history_command(&service, &session).await;
                service.logout(session).await?;
                outcome?;
            }

            Commands::Logins { credentials } => {
                let service = LedgerService::connect(&self.database).await?;
                let session = login(&service, &credentials).await?;
                let outcome = service.login_history(&session.account).await;
                service.logout(session).await?;

                println!("{:<6} {:<20} {:<20}", "ID", "LOGIN", "LOGOUT");
                println!("{}", "-".repeat(48));
                for entry in outcome? {
                    println!(
                        "{:<6} {:<20} {:<20}",
                        entry.id,
                        entry.login_at.format("%Y-%m-%d %H:%M:%S"),
                        entry
                            .logout_at
                            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_else(|| "(open)".to_string())
                    );
                }
            }

            Commands::Password {
                credentials,
                new,
                confirm,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let session = login(&service, &credentials).await?;
                let outcome = service
                    .change_password(&session.account, &credentials.password, &new, &confirm)
                    .await;
                service.logout(session).await?;
                outcome?;
                println!("Password updated!");
            }

            Commands::Profile {
                credentials,
                name,
                city,
                phone,
                email,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let mut session = login(&service, &credentials).await?;
                let update = ProfileUpdate {
                    name,
                    city,
                    phone,
                    email,
                };
                let outcome = service.update_profile(&mut session.account, update).await;
                let holder = session.account.holder.clone();
                service.logout(session).await?;
                outcome?;

                println!("Info updated!");
                println!("  Name:  {}", holder.name);
                println!("  City:  {}", holder.city);
                println!("  Phone: {}", holder.phone);
                println!("  Email: {}", holder.email);
            }

            Commands::Export {
                kind,
                account,
                password,
                output,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_export_command(&service, kind, account, password, output.as_deref()).await?;
            }

            Commands::Quiz(quiz_cmd) => {
                let service = QuizService::connect(&self.database).await?;
                run_quiz_command(&service, quiz_cmd).await?;
            }
        }

        Ok(())
    }
}

async fn login(service: &LedgerService, credentials: &Credentials) -> Result<Session> {
    let number = AccountNumber::from(credentials.account.trim());
    Ok(service.authenticate(&number, &credentials.password).await?)
}

async fn run_accounts_command(service: &LedgerService) -> Result<()> {
    let accounts = service.list_accounts().await?;
    if accounts.is_empty() {
        println!("No accounts yet!");
        return Ok(());
    }

    println!(
        "{:<12} {:<20} {:<15} {:<12} {:<25} {:>12}",
        "ACCOUNT", "NAME", "CITY", "PHONE", "EMAIL", "BALANCE"
    );
    println!("{}", "-".repeat(101));
    for account in accounts {
        println!(
            "{:<12} {:<20} {:<15} {:<12} {:<25} {:>12}",
            account.account_number,
            account.holder.name,
            account.holder.city,
            account.holder.phone,
            account.holder.email,
            format_cents(account.balance)
        );
    }
    Ok(())
}

async fn run_history_command(service: &LedgerService, session: &Session) -> Result<()> {
    let movements = service.get_history(&session.account).await?;
    if movements.is_empty() {
        println!("No movements yet.");
        return Ok(());
    }

    println!(
        "{:<6} {:<20} {:<10} {:>12} {:<12}",
        "SEQ", "DATE", "TYPE", "AMOUNT", "TO"
    );
    println!("{}", "-".repeat(64));
    for movement in movements {
        println!(
            "{:<6} {:<20} {:<10} {:>12} {:<12}",
            movement.sequence,
            movement.timestamp.format("%Y-%m-%d %H:%M:%S"),
            movement.movement_type,
            format_cents(movement.amount),
            movement
                .counterparty
                .map(|n| n.to_string())
                .unwrap_or_default()
        );
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    kind: ExportKind,
    account: Option<String>,
    password: Option<String>,
    output: Option<&str>,
) -> Result<()> {
    let exporter = Exporter::new(service);

    // The output file is only opened once the holder has logged in.
    let summary = match kind {
        ExportKind::Accounts => {
            let count = exporter.export_accounts_csv(open_output(output)?).await?;
            format!("Exported {} accounts", count)
        }
        ExportKind::History => {
            let session = export_login(service, account, password).await?;
            let outcome = async {
                let writer = open_output(output)?;
                exporter.export_history_csv(&session.account, writer).await
            }
            .await;
            service.logout(session).await?;
            format!("Exported {} movements", outcome?)
        }
        ExportKind::Statement => {
            let session = export_login(service, account, password).await?;
            let outcome = async {
                let writer = open_output(output)?;
                exporter.export_statement_json(&session.account, writer).await
            }
            .await;
            service.logout(session).await?;
            let statement = outcome?;
            format!(
                "Exported statement: balance {}, {} movements",
                format_cents(statement.balance),
                statement.movements.len()
            )
        }
    };

    if output.is_some() {
        eprintln!("{}", summary);
    }
    Ok(())
}

async fn export_login(
    service: &LedgerService,
    account: Option<String>,
    password: Option<String>,
) -> Result<Session> {
    match (account, password) {
        (Some(account), Some(password)) => login(service, &Credentials { account, password }).await,
        _ => anyhow::bail!("--account and --password are required for this export"),
    }
}

fn open_output(output: Option<&str>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    })
}

async fn run_quiz_command(service: &QuizService, cmd: QuizCommands) -> Result<()> {
    match cmd {
        QuizCommands::Register { email, password } => {
            let user = service.register(&email, &password).await?;
            println!("Registration successful! ({})", user.email);
        }

        QuizCommands::List => {
            let quizzes = service.list_quizzes().await?;
            for (idx, quiz) in quizzes.iter().enumerate() {
                println!("{}. {} ({} questions)", idx + 1, quiz.name, quiz.total());
            }
        }

        QuizCommands::Take {
            quiz,
            email,
            password,
            answers,
        } => {
            let user = service.login(&email, &password).await?;
            let quiz = service.get_quiz(&quiz).await?;
            let answers = match answers {
                Some(list) => parse_answers(&list)?,
                None => prompt_answers(&quiz)?,
            };
            let attempt = service.take_quiz(&user, &quiz.name, &answers).await?;
            println!(
                "You scored {}/{} in {}!",
                attempt.score, attempt.total, attempt.quiz_name
            );
        }

        QuizCommands::Results { email, password } => {
            let user = service.login(&email, &password).await?;
            print_results(service, &user).await?;
        }
    }
    Ok(())
}

async fn print_results(service: &QuizService, user: &QuizUser) -> Result<()> {
    let attempts = service.results(user).await?;
    if attempts.is_empty() {
        println!("No quizzes attempted yet.");
        return Ok(());
    }

    println!("Results for {}:", user.email);
    for attempt in attempts {
        println!(
            "  {:<12} {}/{}  ({})",
            attempt.quiz_name,
            attempt.score,
            attempt.total,
            attempt.taken_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Ask each question on stdout and read one option number per line.
fn prompt_answers(quiz: &Quiz) -> Result<Vec<usize>> {
    let stdin = stdin();
    let mut lines = stdin.lock().lines();
    let mut answers = Vec::with_capacity(quiz.questions.len());

    for (idx, question) in quiz.questions.iter().enumerate() {
        println!("\nQ{}: {}", idx + 1, question.prompt);
        for (i, option) in question.options.iter().enumerate() {
            println!("{}. {}", i + 1, option);
        }
        print!("Your answer (1-{}): ", question.options.len());
        stdout().flush()?;

        let line = lines
            .next()
            .transpose()
            .context("Failed to read answer")?
            .unwrap_or_default();
        // Anything unparseable scores zero for this question.
        answers.push(line.trim().parse().unwrap_or(0));
    }
    Ok(answers)
}

fn parse_answers(list: &str) -> Result<Vec<usize>> {
    list.split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid answer '{}', expected an option number", part))
        })
        .collect()
}

fn parse_amount(input: &str) -> Result<Cents> {
    parse_cents(input).context("Invalid amount format. Use '50.00' or '50'")
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))
}
