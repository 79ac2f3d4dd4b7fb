//! One-shot snapshot loader. Reads the data directory at startup and hands
//! back an immutable `RecordStore`; missing side-files are valid (empty
//! tables), a malformed or invariant-violating employee snapshot is fatal.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::{error, info, warn};

use super::models::{EmployeeRecord, Persona};
use super::validate::validate_employees;
use super::RecordStore;

pub fn load_store(data_dir: &Path) -> Result<RecordStore> {
    let employees = load_employees(&data_dir.join("employees").join("employees.json"))?;

    let errors = validate_employees(&employees);
    if !errors.is_empty() {
        for err in &errors {
            error!("{err}");
        }
        bail!("employee snapshot validation failed ({} errors)", errors.len());
    }

    let personas = load_personas(&data_dir.join("personas").join("personas.json"))?;
    let resumes = load_resumes(&data_dir.join("resumes"));
    let reviews_dir = data_dir.join("reviews");
    let monthly = load_jsonl(&reviews_dir.join("monthly_review.jsonl.json"));
    let half_year = load_jsonl(&reviews_dir.join("half_year_review.jsonl.json"));

    info!(
        "Record store loaded: {} employees, {} personas, {} resumes, {} monthly / {} half-year reviews",
        employees.len(),
        personas.len(),
        resumes.len(),
        monthly.len(),
        half_year.len()
    );

    Ok(RecordStore::new(employees)
        .with_personas(personas)
        .with_resumes(resumes)
        .with_reviews(monthly, half_year))
}

fn load_employees(path: &Path) -> Result<Vec<EmployeeRecord>> {
    if !path.exists() {
        warn!("Employee snapshot {} not found; starting with an empty store", path.display());
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read employee snapshot {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse employee snapshot {}", path.display()))
}

fn load_personas(path: &Path) -> Result<HashMap<String, Persona>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read persona table {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse persona table {}", path.display()))
}

fn load_resumes(dir: &Path) -> Vec<(String, String)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut resumes = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(text) => resumes.push((stem.to_string(), text)),
            Err(err) => warn!("Skipping unreadable resume {}: {err}", path.display()),
        }
    }
    // Deterministic lookup order regardless of directory iteration order.
    resumes.sort_by(|a, b| a.0.cmp(&b.0));
    resumes
}

/// Reads a JSON-lines review file. Any parse error discards the whole file
/// (with a warning) rather than serving a partial table.
fn load_jsonl(path: &Path) -> Vec<Value> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(value) => rows.push(value),
            Err(err) => {
                warn!("Error parsing JSONL file {}: {err}", path.display());
                return Vec::new();
            }
        }
    }
    rows
}
