//! Command-line driver for the carbon calculator core.
//!
//! # Responsibility
//! - Provide a minimal executable over a SQLite catalog file.
//! - Keep output deterministic JSON for scripting and smoke checks.
//!
//! Usage:
//! - `carbon_cli ping`
//! - `carbon_cli list <user_id> [--admin] [--category C] [--q TEXT]`
//! - `carbon_cli calc <user_id> [--admin] <material_id=qty>...`

use carbon_core::db::open_db;
use carbon_core::{
    core_version, init_logging, top_n, CatalogFilters, CatalogService, CoreConfig, LineItem,
    Principal, SqliteMaterialRepository, UserId,
};
use log::error;
use serde_json::json;
use std::error::Error;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> CliResult<String> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let (command, rest) = args.split_first().ok_or_else(usage)?;
    match command.as_str() {
        "ping" => Ok(format!("carbon_core version={}", core_version())),
        "list" => list(&config, rest),
        "calc" => calc(&config, rest),
        _ => Err(usage()),
    }
}

fn list(config: &CoreConfig, args: &[String]) -> CliResult<String> {
    let (principal, rest) = parse_principal(args)?;
    let mut filters = CatalogFilters::default();
    let mut iter = rest.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| format!("flag `{flag}` expects a value"))?;
        match flag.as_str() {
            "--category" => filters.category = Some(value.clone()),
            "--q" => filters.name_contains = Some(value.clone()),
            other => return Err(format!("unknown flag `{other}`").into()),
        }
    }

    let conn = open_db(&config.db_path)?;
    let catalog = CatalogService::new(SqliteMaterialRepository::try_new(&conn)?);
    let materials = catalog.list_visible(Some(&principal), &filters)?;
    Ok(serde_json::to_string_pretty(&materials)?)
}

fn calc(config: &CoreConfig, args: &[String]) -> CliResult<String> {
    let (principal, rest) = parse_principal(args)?;
    let items = rest
        .iter()
        .map(String::as_str)
        .map(parse_line_item)
        .collect::<CliResult<Vec<_>>>()?;

    let conn = open_db(&config.db_path)?;
    let catalog = CatalogService::new(SqliteMaterialRepository::try_new(&conn)?);
    let result = catalog.calculate(Some(&principal), &items)?;
    let ranking = top_n(&result.breakdown, config.top_n);

    let output = json!({
        "resultado": result,
        "top": ranking,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

fn parse_principal(args: &[String]) -> CliResult<(Principal, Vec<String>)> {
    let (user_id, rest) = args.split_first().ok_or_else(usage)?;
    let user_id: UserId = user_id
        .parse()
        .map_err(|_| format!("invalid user id `{user_id}`"))?;

    let is_admin = rest.iter().any(|arg| arg == "--admin");
    let rest = rest
        .iter()
        .filter(|arg| arg.as_str() != "--admin")
        .cloned()
        .collect();

    Ok((
        Principal {
            user_id: Some(user_id),
            is_admin,
        },
        rest,
    ))
}

/// Parses `material_id=quantity`. Quantities go through the same lenient
/// coercion as JSON request bodies.
fn parse_line_item(arg: &str) -> CliResult<LineItem> {
    let (material_id, quantity) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected `material_id=quantity`, got `{arg}`"))?;
    let item = serde_json::from_value(json!({
        "material_id": material_id,
        "quantidade": quantity,
    }))?;
    Ok(item)
}

fn usage() -> Box<dyn Error> {
    "usage: carbon_cli ping | list <user_id> [--admin] [--category C] [--q TEXT] | calc <user_id> [--admin] <material_id=qty>..."
        .into()
}
