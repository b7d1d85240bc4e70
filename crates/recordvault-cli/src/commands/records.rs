use std::io::{IsTerminal, Read};

use dialoguer::Confirm;
use serde_json::Value;

use recordvault_core::records::RecordRequest;

use crate::app::AppContext;
use crate::cli::{RecordCommand, RecordFields, TokenArgs};
use crate::errors::CliError;
use crate::output::{print_json, print_record, record_table};

pub fn handle_record(ctx: &AppContext, command: &RecordCommand) -> anyhow::Result<()> {
    match command {
        RecordCommand::Add { token, fields } => handle_add(ctx, token, fields),
        RecordCommand::List { token } => handle_list(ctx, token),
        RecordCommand::Show { token, id } => handle_show(ctx, token, *id),
        RecordCommand::Update { token, id, fields } => handle_update(ctx, token, *id, fields),
        RecordCommand::Delete { token, id, yes } => handle_delete(ctx, token, *id, *yes),
    }
}

fn require_token(args: &TokenArgs) -> anyhow::Result<&str> {
    args.token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            CliError::auth_failed_with_hint(
                "No session token provided.",
                "Run:\n  export RECORDVAULT_TOKEN=$(recordvault login <EMAIL>)",
            )
            .into()
        })
}

/// Payload from `--data` (JSON), `--text`, or piped stdin (text).
fn read_payload(fields: &RecordFields) -> anyhow::Result<Value> {
    if let Some(data) = &fields.data {
        return serde_json::from_str(data)
            .map_err(|e| CliError::invalid_input(format!("--data is not valid JSON: {}", e)).into());
    }
    if let Some(text) = &fields.text {
        return Ok(Value::String(text.clone()));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(CliError::invalid_input(
            "No payload provided. Use --data, --text, or pipe it on stdin.",
        )
        .into());
    }
    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    let trimmed = buffer.strip_suffix('\n').unwrap_or(&buffer);
    Ok(Value::String(trimmed.to_string()))
}

fn build_request(fields: &RecordFields) -> anyhow::Result<RecordRequest> {
    let request = RecordRequest::new(&fields.name, &fields.email, read_payload(fields)?);
    request.validate()?;
    Ok(request)
}

fn handle_add(ctx: &AppContext, token: &TokenArgs, fields: &RecordFields) -> anyhow::Result<()> {
    let token = require_token(token)?;
    let request = build_request(fields)?;
    let id = ctx.vault()?.add_record(token, &request)?;

    if ctx.json() {
        return print_json(&serde_json::json!({ "id": id }));
    }
    if ctx.quiet() {
        println!("{}", id);
    } else {
        println!("Added record {}", id);
    }
    Ok(())
}

fn handle_list(ctx: &AppContext, token: &TokenArgs) -> anyhow::Result<()> {
    let token = require_token(token)?;
    let views = ctx.vault()?.list_records(token)?;

    if ctx.json() {
        return print_json(&views);
    }
    if views.is_empty() {
        if !ctx.quiet() {
            println!("No records.");
        }
        return Ok(());
    }
    println!("{}", record_table(&views));

    let failed = views.iter().filter(|v| !v.payload.is_decrypted()).count();
    if failed > 0 {
        eprintln!(
            "Warning: {} record(s) could not be decrypted; see the log for details",
            failed
        );
    }
    Ok(())
}

fn handle_show(ctx: &AppContext, token: &TokenArgs, id: i64) -> anyhow::Result<()> {
    let token = require_token(token)?;
    let record = ctx.vault()?.get_record(token, id)?;

    if ctx.json() {
        return print_json(&record);
    }
    print_record(&record, ctx.quiet())
}

fn handle_update(
    ctx: &AppContext,
    token: &TokenArgs,
    id: i64,
    fields: &RecordFields,
) -> anyhow::Result<()> {
    let token = require_token(token)?;
    let request = build_request(fields)?;
    ctx.vault()?.update_record(token, id, &request)?;

    if ctx.json() {
        return print_json(&serde_json::json!({ "id": id, "updated": true }));
    }
    if !ctx.quiet() {
        println!("Updated record {}", id);
    }
    Ok(())
}

fn handle_delete(ctx: &AppContext, token: &TokenArgs, id: i64, yes: bool) -> anyhow::Result<()> {
    let token = require_token(token)?;
    let vault = ctx.vault()?;
    vault.authorize(token)?;

    if !yes {
        if !ctx.interactive() {
            return Err(CliError::invalid_input(
                "Refusing to delete without confirmation. Pass --yes.",
            )
            .into());
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete record {}?", id))
            .default(false)
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))?;
        if !confirmed {
            if !ctx.quiet() {
                println!("Cancelled");
            }
            return Ok(());
        }
    }

    vault.delete_record(token, id)?;
    if ctx.json() {
        return print_json(&serde_json::json!({ "id": id, "deleted": true }));
    }
    if !ctx.quiet() {
        println!("Deleted record {}", id);
    }
    Ok(())
}
