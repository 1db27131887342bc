//! Money commands - deposit, withdraw and transfer

use anyhow::Result;
use colored::Colorize;
use ledger_core::{AccountId, DepositRequest, TransferRequest, WithdrawRequest};
use serde_json::json;

use super::{authorize, get_context, parse_amount};
use crate::output;

pub fn run_deposit(account_id: i64, amount: &str, json: bool) -> Result<()> {
    let amount = parse_amount(amount)?;
    let account_id = AccountId(account_id);

    let ctx = get_context()?;
    let balance = ctx
        .ledger_service
        .deposit(&DepositRequest { account_id, amount })?;

    if json {
        return output::json(json!({ "id": account_id, "balance": balance }));
    }
    output::success(&format!(
        "Deposited {} into account {}",
        output::format_money(amount),
        account_id
    ));
    println!("  New balance: {}", output::format_money(balance).bold());
    Ok(())
}

pub fn run_withdraw(
    account_id: i64,
    amount: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let amount = parse_amount(amount)?;
    let account_id = AccountId(account_id);

    let ctx = get_context()?;
    authorize(&ctx, account_id, password)?;
    let balance = ctx
        .ledger_service
        .withdraw(&WithdrawRequest { account_id, amount })?;

    if json {
        return output::json(json!({ "id": account_id, "balance": balance }));
    }
    output::success(&format!(
        "Withdrew {} from account {}",
        output::format_money(amount),
        account_id
    ));
    println!("  New balance: {}", output::format_money(balance).bold());
    Ok(())
}

pub fn run_transfer(
    sender_id: i64,
    receiver_id: i64,
    amount: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let amount = parse_amount(amount)?;
    let request = TransferRequest {
        sender_id: AccountId(sender_id),
        receiver_id: AccountId(receiver_id),
        amount,
    };

    let ctx = get_context()?;
    if request.sender_id != request.receiver_id {
        authorize(&ctx, request.sender_id, password)?;
    }
    let outcome = ctx.ledger_service.transfer(&request)?;

    if json {
        return output::json(&outcome);
    }
    output::success(&format!(
        "Transferred {} from account {} to account {}",
        output::format_money(amount),
        request.sender_id,
        request.receiver_id
    ));
    println!(
        "  Account {} balance: {}",
        request.sender_id,
        output::format_money(outcome.sender_balance).bold()
    );
    println!(
        "  Account {} balance: {}",
        request.receiver_id,
        output::format_money(outcome.receiver_balance).bold()
    );
    println!("  Transaction: #{}", outcome.record.id);
    Ok(())
}
