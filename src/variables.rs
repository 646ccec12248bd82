//! # Variable Resolution
//!
//! Rules carry default variables; projects persist per-rule variables in
//! the manifest; invocations add `--data` JSON and `--var key=value`
//! overrides. This module merges those sources into the effective variable
//! set a rule is rendered with.
//!
//! Precedence, lowest to highest: rule defaults, project variables,
//! `--data`, `--var`. Later sources overwrite identical keys from earlier
//! sources. Merging is shallow, by top-level key; nested structures are
//! replaced wholesale, never deep-merged.
//!
//! Values are a small closed tagged type ([`VarValue`]) rather than
//! free-form dynamic maps, so rendering never type-sniffs at display time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A variable value carried through resolution and rendering.
///
/// Closed set by design: every value is one of these five shapes, decided
/// at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Any structured JSON value (object or array).
    Json(serde_json::Value),
}

impl VarValue {
    /// Convert a JSON value into the matching `VarValue` shape.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => VarValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    VarValue::Int(i)
                } else {
                    VarValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => VarValue::String(s),
            other => VarValue::Json(other),
        }
    }

    /// Render this value as the text substituted into rule bodies.
    ///
    /// Structured values render as compact JSON, which is deterministic for
    /// identical inputs.
    pub fn render(&self) -> String {
        match self {
            VarValue::Bool(b) => b.to_string(),
            VarValue::Int(i) => i.to_string(),
            VarValue::Float(f) => f.to_string(),
            VarValue::String(s) => s.clone(),
            VarValue::Json(v) => v.to_string(),
        }
    }
}

/// The effective variable set for one rule, ordered for deterministic
/// rendering.
pub type VarMap = BTreeMap<String, VarValue>;

/// Merge variable sources into the effective set for one rule.
///
/// `defaults` come from the rule document, `project_vars` from the
/// manifest entry, `cli_data` from `--data`, and `cli_vars` from repeated
/// `--var` flags.
pub fn resolve(
    defaults: &VarMap,
    project_vars: &VarMap,
    cli_data: &VarMap,
    cli_vars: &VarMap,
) -> VarMap {
    let mut merged = defaults.clone();
    for source in [project_vars, cli_data, cli_vars] {
        for (key, value) in source {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Parse one `--var key=value` flag.
///
/// The value is parsed as JSON first and falls back to a plain string, so
/// `--var retries=3` yields an integer while `--var name=api` yields a
/// string. A flag with no `=` is a validation error naming the flag value.
pub fn parse_var_flag(flag: &str) -> Result<(String, VarValue)> {
    let (key, raw) = flag.split_once('=').ok_or_else(|| Error::InvalidFlagValue {
        value: flag.to_string(),
        message: "expected key=value".to_string(),
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(Error::InvalidFlagValue {
            value: flag.to_string(),
            message: "empty variable name".to_string(),
        });
    }

    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => VarValue::from_json(json),
        Err(_) => VarValue::String(raw.to_string()),
    };

    Ok((key.to_string(), value))
}

/// Parse the repeated `--var` flags into a map.
pub fn parse_var_flags(flags: &[String]) -> Result<VarMap> {
    let mut vars = VarMap::new();
    for flag in flags {
        let (key, value) = parse_var_flag(flag)?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Parse a `--data` JSON blob into a map.
///
/// The blob must be a JSON object; anything else is a validation error
/// naming the offending value.
pub fn parse_data_json(data: &str) -> Result<VarMap> {
    let value: serde_json::Value =
        serde_json::from_str(data).map_err(|e| Error::InvalidFlagValue {
            value: data.to_string(),
            message: format!("invalid JSON: {}", e),
        })?;

    let serde_json::Value::Object(object) = value else {
        return Err(Error::InvalidFlagValue {
            value: data.to_string(),
            message: "expected a JSON object".to_string(),
        });
    };

    Ok(object
        .into_iter()
        .map(|(k, v)| (k, VarValue::from_json(v)))
        .collect())
}
