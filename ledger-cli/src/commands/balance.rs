//! Read commands - balances and account history

use anyhow::Result;
use colored::Colorize;
use ledger_core::{AccountId, LedgerContext, TransactionKind};
use rust_decimal::Decimal;
use serde_json::json;

use super::{authorize, get_context};
use crate::output;

pub fn run_balance(account_id: i64, password: Option<String>, json: bool) -> Result<()> {
    let account_id = AccountId(account_id);
    let ctx = get_context()?;
    let balance = read_balance(&ctx, account_id, password)?;

    if json {
        return output::json(json!({ "id": account_id, "balance": balance }));
    }
    println!(
        "Account {}: {}",
        account_id,
        output::format_money(balance).bold()
    );
    Ok(())
}

/// Balance of one account, behind its password when it has one
pub fn read_balance(
    ctx: &LedgerContext,
    account_id: AccountId,
    password: Option<String>,
) -> Result<Decimal> {
    authorize(ctx, account_id, password)?;
    Ok(ctx.ledger_service.balance(account_id)?)
}

pub fn run_balances(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let balances = ctx.ledger_service.balances()?;

    if json {
        return output::json(&balances);
    }
    if balances.is_empty() {
        output::info("No active accounts.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Account", "Balance"]);
    for entry in &balances {
        table.add_row(vec![entry.id.to_string(), output::format_money(entry.balance)]);
    }
    println!("{}", table);
    Ok(())
}

pub fn run_history(account_id: i64, json: bool) -> Result<()> {
    let account_id = AccountId(account_id);
    let ctx = get_context()?;
    let records = ctx.ledger_service.history(account_id)?;

    if json {
        return output::json(&records);
    }
    if records.is_empty() {
        output::info(&format!("No transactions for account {}.", account_id));
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["#", "Time", "Kind", "From", "To", "Amount", "Balance"]);
    for record in &records {
        let effect = record.net_effect(account_id);
        let signed = if effect.is_sign_negative() {
            output::format_money(effect).red().to_string()
        } else {
            format!("+{}", output::format_money(effect)).green().to_string()
        };

        // Balance of this account after the record committed
        let balance_after = match record.kind {
            TransactionKind::Deposit => record.receiver_new_balance,
            TransactionKind::Withdraw => record.sender_new_balance,
            TransactionKind::Transfer if record.sender_id == Some(account_id) => {
                record.sender_new_balance
            }
            TransactionKind::Transfer => record.receiver_new_balance,
        };

        table.add_row(vec![
            record.id.to_string(),
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.kind.to_string(),
            output::format_opt(record.sender_id),
            output::format_opt(record.receiver_id),
            signed,
            output::format_opt(balance_after.map(output::format_money)),
        ]);
    }
    println!("{}", table);
    Ok(())
}
