//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::{Map, Value};

use millbook_core::form::rules;
use millbook_core::{DerivedFieldEngine, FormValues, Ledger, Row};

use crate::cli::WriteArgs;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Split `field=value`.
pub fn split_pair<'a>(pair: &'a str, flag: &str) -> Result<(&'a str, &'a str), CliError> {
    match pair.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => Ok((field.trim(), value)),
        _ => Err(CliError::Validation {
            field: flag.into(),
            reason: format!("expected FIELD=VALUE, got '{pair}'"),
        }),
    }
}

/// A `--set` value: JSON when it parses as JSON, text otherwise.
fn set_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Collect `--from-file` and `--set` into form values.
pub fn form_values(write: &WriteArgs) -> Result<FormValues, CliError> {
    let mut object = match write.from_file.as_deref().map(read_json_file).transpose()? {
        None => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(CliError::Validation {
                field: "from-file".into(),
                reason: "expected a JSON object".into(),
            });
        }
    };
    for pair in &write.set {
        let (field, raw) = split_pair(pair, "set")?;
        object.insert(field.to_owned(), set_value(raw));
    }
    if object.is_empty() {
        return Err(CliError::Validation {
            field: "set".into(),
            reason: "no fields given; use --set or --from-file".into(),
        });
    }
    Ok(FormValues::from_row(&Row::from_value(Value::Object(object))))
}

/// Run the ledger's derivation rules once over `values`, as the form
/// would on mount, and reject the submission if a required field is empty.
pub fn derive_fields(ledger: Ledger, values: FormValues) -> Result<FormValues, CliError> {
    let engine = DerivedFieldEngine::new();
    for rule in rules::for_ledger(ledger) {
        engine.register_rule(rule)?;
    }
    engine.load(values);
    engine.prime();
    engine.unmount();

    let missing = engine.required_missing();
    if !missing.is_empty() {
        return Err(CliError::RequiredMissing {
            fields: missing.join(", "),
        });
    }
    Ok(engine.values())
}
