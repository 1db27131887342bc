//! Export command - transaction log as CSV

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use ledger_core::AccountId;
use serde_json::json;

use super::get_context;
use crate::output;

pub fn run(account: Option<i64>, path: Option<PathBuf>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let account = account.map(AccountId);

    let Some(path) = path else {
        // CSV goes to stdout; nothing else may be printed
        ctx.export_service.export_csv(account, io::stdout().lock())?;
        return Ok(());
    };

    let file = File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let count = ctx.export_service.export_csv(account, BufWriter::new(file))?;

    if json {
        output::json(json!({ "path": path, "records": count }))
    } else {
        output::success(&format!("Exported {} transactions to {}", count, path.display()));
        Ok(())
    }
}
