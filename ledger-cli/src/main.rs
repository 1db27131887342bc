//! Ledger CLI - account balances and transfers from the terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{account, balance, export, logs, money, status};
use ledger_core::{Error, ErrorKind, LogEvent, OperationResult};

/// Ledger - per-account balances with an immutable transaction log
#[derive(Parser)]
#[command(name = "ldg", version, about, long_about = None)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account without a password
    New {
        /// Account holder name
        #[arg(long)]
        name: Option<String>,
        /// Email address (unique among active accounts)
        #[arg(long)]
        email: Option<String>,
        /// Age in years
        #[arg(long)]
        age: Option<u32>,
    },

    /// Create a password-protected account
    Signup {
        /// Account holder name
        #[arg(long)]
        name: Option<String>,
        /// Email address (unique among active accounts)
        #[arg(long)]
        email: Option<String>,
        /// Age in years
        #[arg(long)]
        age: Option<u32>,
        /// Password (prompted when omitted)
        #[arg(long, env = "LEDGER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Add money to an account
    Deposit {
        /// Account ID
        account_id: i64,
        /// Amount, at most two decimal places
        amount: String,
    },

    /// Take money out of an account
    Withdraw {
        /// Account ID
        account_id: i64,
        /// Amount, at most two decimal places
        amount: String,
        /// Account password, required for password-protected accounts
        #[arg(long, env = "LEDGER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Move money between two accounts
    Transfer {
        /// Sending account ID
        sender_id: i64,
        /// Receiving account ID
        receiver_id: i64,
        /// Amount, at most two decimal places
        amount: String,
        /// Sender's password, required for password-protected accounts
        #[arg(long, env = "LEDGER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show one account's balance
    Balance {
        /// Account ID
        account_id: i64,
        /// Account password, required for password-protected accounts
        #[arg(long, env = "LEDGER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show the balance of every active account
    Balances,

    /// Show the transactions involving an account
    History {
        /// Account ID
        account_id: i64,
    },

    /// Delete an account (its history is kept)
    Delete {
        /// Account ID
        account_id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Show ledger totals
    Status,

    /// Export the transaction log as CSV
    Export {
        /// Only transactions involving this account
        #[arg(long)]
        account: Option<i64>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// View and manage the operational event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    /// Name recorded in the event log
    fn name(&self) -> &'static str {
        match self {
            Commands::New { .. } => "new",
            Commands::Signup { .. } => "signup",
            Commands::Deposit { .. } => "deposit",
            Commands::Withdraw { .. } => "withdraw",
            Commands::Transfer { .. } => "transfer",
            Commands::Balance { .. } => "balance",
            Commands::Balances => "balances",
            Commands::History { .. } => "history",
            Commands::Delete { .. } => "delete",
            Commands::Status => "status",
            Commands::Export { .. } => "export",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LEDGER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;
    let command_name = cli.command.name();
    let logger = commands::get_logger();

    let result = run(cli);

    match result {
        Ok(()) => {
            if let Some(logger) = &logger {
                let _ = logger.log_command(command_name);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let kind = error_kind(&e);
            if let Some(logger) = &logger {
                let _ = match kind {
                    Some(kind) => logger.log_failure(command_name, kind),
                    None => logger.log(LogEvent::new("command_failed").with_command(command_name)),
                };
            }
            if json {
                let failure = OperationResult::<()>::fail(format!("{:#}", e), kind);
                match serde_json::to_string_pretty(&failure) {
                    Ok(body) => println!("{}", body),
                    Err(_) => output::error(&format!("{:#}", e)),
                }
            } else {
                output::error(&format!("Error: {:#}", e));
            }
            ExitCode::from(exit_code(kind))
        }
    }
}

/// Ledger error kind anywhere in the error chain
fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::kind)
}

fn exit_code(kind: Option<ErrorKind>) -> u8 {
    match kind {
        Some(
            ErrorKind::InvalidAmount
            | ErrorKind::Validation
            | ErrorKind::SelfTransfer
            | ErrorKind::EmailTaken
            | ErrorKind::InvalidCredentials,
        ) => 2,
        Some(ErrorKind::AccountNotFound) => 3,
        Some(ErrorKind::InsufficientBalance) => 4,
        _ => 1,
    }
}

fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::New { name, email, age } => account::run_new(name, email, age, json),
        Commands::Signup {
            name,
            email,
            age,
            password,
        } => account::run_signup(name, email, age, password, json),
        Commands::Deposit { account_id, amount } => money::run_deposit(account_id, &amount, json),
        Commands::Withdraw {
            account_id,
            amount,
            password,
        } => money::run_withdraw(account_id, &amount, password, json),
        Commands::Transfer {
            sender_id,
            receiver_id,
            amount,
            password,
        } => money::run_transfer(sender_id, receiver_id, &amount, password, json),
        Commands::Balance {
            account_id,
            password,
        } => balance::run_balance(account_id, password, json),
        Commands::Balances => balance::run_balances(json),
        Commands::History { account_id } => balance::run_history(account_id, json),
        Commands::Delete { account_id, force } => account::run_delete(account_id, force, json),
        Commands::Status => status::run(json),
        Commands::Export { account, output } => export::run(account, output, json),
        Commands::Logs { command } => logs::run(command, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ledger_core::AccountId;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_json_flag_is_global() {
        let cli = Cli::try_parse_from(["ldg", "balance", "7", "--json"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.command.name(), "balance");
    }

    #[test]
    fn test_balance_accepts_password() {
        let cli = Cli::try_parse_from(["ldg", "balance", "7", "--password", "secret123"]).unwrap();
        match cli.command {
            Commands::Balance {
                account_id,
                password,
            } => {
                assert_eq!(account_id, 7);
                assert_eq!(password.as_deref(), Some("secret123"));
            }
            _ => panic!("expected balance command"),
        }
    }

    #[test]
    fn test_exit_codes() {
        let not_found = anyhow::Error::new(Error::AccountNotFound(AccountId(1)));
        assert_eq!(exit_code(error_kind(&not_found)), 3);

        let wrapped = anyhow::Error::new(Error::invalid_amount("too precise")).context("deposit failed");
        assert_eq!(exit_code(error_kind(&wrapped)), 2);

        assert_eq!(exit_code(Some(ErrorKind::InsufficientBalance)), 4);
        assert_eq!(exit_code(Some(ErrorKind::InvalidCredentials)), 2);
        assert_eq!(exit_code(Some(ErrorKind::Persistence)), 1);
        assert_eq!(exit_code(None), 1);
    }
}
