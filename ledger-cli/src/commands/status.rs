//! Status command - show ledger totals

use anyhow::Result;
use colored::Colorize;
use ledger_core::AccountStatus;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        return output::json(&status);
    }

    println!("{}", "Ledger Status".bold());
    println!();

    let mut summary = output::create_table();
    summary.add_row(vec!["Accounts".to_string(), status.total_accounts.to_string()]);
    summary.add_row(vec!["Deleted".to_string(), status.deleted_accounts.to_string()]);
    summary.add_row(vec![
        "Total balance".to_string(),
        output::format_money(status.total_balance),
    ]);
    summary.add_row(vec![
        "Transactions".to_string(),
        status.total_transactions.to_string(),
    ]);
    println!("{}", summary);

    if status.accounts.is_empty() {
        return Ok(());
    }

    println!();
    let mut accounts = output::create_table();
    accounts.set_header(vec!["ID", "Name", "Balance", "Status"]);
    for account in &status.accounts {
        let state = match account.status {
            AccountStatus::Active => account.status.as_str().green().to_string(),
            AccountStatus::Deleted => account.status.as_str().dimmed().to_string(),
        };
        accounts.add_row(vec![
            account.id.to_string(),
            account.name.clone(),
            output::format_money(account.balance),
            state,
        ]);
    }
    println!("{}", accounts);
    Ok(())
}
