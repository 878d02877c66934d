use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use comfy_table::Table;
use intake_core::{IntakePipeline, StaticSuggestionProvider};
use intake_gate::RequestSigner;
use intake_map::SynonymTable;
use intake_model::{CanonicalField, IntakeResponse};
use tracing::info;

use intake_cli::config::load_config;
use intake_cli::input::{load_request, read_suggestions};

use crate::cli::{ProcessArgs, SignArgs};
use crate::summary::{apply_table_style, header_cell};

/// Environment variable holding the shared signing secret.
pub const SECRET_ENV: &str = "FREIGHT_INTAKE_SECRET";

pub fn run_process(args: &ProcessArgs, config_path: Option<&Path>) -> Result<IntakeResponse> {
    let config = load_config(config_path)?;
    let mut options = config.processing;
    if let Some(timezone) = &args.timezone {
        options.timezone = timezone.clone();
    }
    if let Some(order) = args.date_order {
        options.date_order = order.into();
    }
    if let Some(limit) = args.row_limit {
        options.row_limit = Some(limit);
    }
    if let Some(millis) = args.suggest_timeout_ms {
        options.suggestion_timeout_ms = millis;
    }

    let request = load_request(&args.input)?;
    info!(
        input = %args.input.display(),
        headers = request.table.headers.len(),
        rows = request.table.rows.len(),
        "loaded request"
    );

    let response = match &args.suggestions {
        Some(path) => {
            let reply = read_suggestions(path)?;
            let pipeline = IntakePipeline::new(options)
                .with_provider(Arc::new(StaticSuggestionProvider::new(reply)));
            pipeline
                .process_blocking(&request)
                .context("start async runtime")?
        }
        None => IntakePipeline::new(options).process(&request),
    };

    if let Some(output) = &args.output {
        let json = serde_json::to_string_pretty(&response).context("serialize response")?;
        fs::write(output, json).with_context(|| format!("write {}", output.display()))?;
    }
    Ok(response)
}

pub fn run_synonyms() -> Result<()> {
    let synonyms = SynonymTable::stock();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Required"),
        header_cell("Phrases"),
        header_cell("Split fragments"),
    ]);
    apply_table_style(&mut table);
    for (field, phrases) in synonyms.iter() {
        let split = synonyms
            .split_fragments(field)
            .map(|fragments| {
                format!(
                    "date: {}\ntime: {}",
                    fragments.date.join(", "),
                    if fragments.time.is_empty() {
                        "-".to_string()
                    } else {
                        fragments.time.join(", ")
                    }
                )
            })
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            field.as_str().to_string(),
            required_label(field).to_string(),
            phrases.join(", "),
            split,
        ]);
    }
    println!("{table}");
    Ok(())
}

fn required_label(field: CanonicalField) -> &'static str {
    if field.is_required() { "yes" } else { "no" }
}

pub fn run_sign(args: &SignArgs) -> Result<()> {
    let secret = std::env::var(SECRET_ENV).with_context(|| format!("{SECRET_ENV} is not set"))?;
    if secret.is_empty() {
        bail!("{SECRET_ENV} is empty");
    }
    let content = fs::read_to_string(&args.body)
        .with_context(|| format!("read body: {}", args.body.display()))?;
    let body: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("parse body: {}", args.body.display()))?;
    let signer = RequestSigner::new(secret.into_bytes())?;
    println!("{}", signer.sign(args.timestamp, &body)?);
    Ok(())
}
