//! Account commands - create, sign up and delete accounts

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Confirm, Input, Password};
use ledger_core::domain::MIN_PASSWORD_LEN;
use ledger_core::{Account, AccountId, CreateAccountRequest, SignUpRequest};
use serde_json::json;

use super::get_context;
use crate::output;

fn prompt_or(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}

pub fn run_new(
    name: Option<String>,
    email: Option<String>,
    age: Option<u32>,
    json: bool,
) -> Result<()> {
    let request = CreateAccountRequest {
        name: prompt_or(name, "Name")?,
        email: prompt_or(email, "Email")?,
        age,
    };

    let ctx = get_context()?;
    let account = ctx.account_service.create_account(&request)?;
    print_created(&account, json)
}

pub fn run_signup(
    name: Option<String>,
    email: Option<String>,
    age: Option<u32>,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let name = prompt_or(name, "Name")?;
    let email = prompt_or(email, "Email")?;
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt(format!("Password (min {} characters)", MIN_PASSWORD_LEN))
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    let ctx = get_context()?;
    let account = ctx.account_service.sign_up(&SignUpRequest {
        name,
        age,
        email,
        password,
    })?;
    print_created(&account, json)
}

fn print_created(account: &Account, json: bool) -> Result<()> {
    if json {
        return output::json(account);
    }

    output::success("Account created");
    println!("  ID: {}", account.id.to_string().bold());
    println!("  Name: {}", account.name);
    println!("  Email: {}", account.email);
    if let Some(age) = account.age {
        println!("  Age: {}", age);
    }
    println!("  Balance: {}", output::format_money(account.balance));
    Ok(())
}

pub fn run_delete(account_id: i64, force: bool, json: bool) -> Result<()> {
    let account_id = AccountId(account_id);
    let ctx = get_context()?;
    let account = ctx.account_service.get_account(account_id)?;

    if !force && !json {
        println!(
            "Account {} ({}) has a balance of {}.",
            account.id,
            account.email,
            output::format_money(account.balance)
        );
        if !Confirm::new()
            .with_prompt("Delete this account? Its history is kept.")
            .default(false)
            .interact()?
        {
            println!("Cancelled.");
            return Ok(());
        }
    }

    ctx.account_service.delete_account(account_id)?;

    if json {
        output::json(json!({ "id": account_id, "deleted": true }))
    } else {
        output::success(&format!("Account {} deleted", account_id));
        Ok(())
    }
}
