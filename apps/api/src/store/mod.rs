//! Record Store — read-only, in-memory view of the employee roster and its
//! persona/resume/review side-tables.
//!
//! Built once at process start by `loader::load_store` and shared by `Arc`;
//! nothing mutates it afterwards, so concurrent requests may read it without
//! synchronization.

pub mod loader;
pub mod models;
pub mod validate;

use std::collections::HashMap;

use serde_json::Value;

use self::models::{EmployeeRecord, Persona, ReviewBundle};

#[derive(Debug)]
pub struct RecordStore {
    employees: Vec<EmployeeRecord>,
    personas: HashMap<String, Persona>,
    /// Resume files keyed by filename stem (`EMP{id}_name`), kept as a list
    /// so the loose id-containment fallback lookup stays possible.
    resumes: Vec<(String, String)>,
    monthly_reviews: Vec<Value>,
    half_year_reviews: Vec<Value>,
}

impl RecordStore {
    pub fn new(employees: Vec<EmployeeRecord>) -> Self {
        Self {
            employees,
            personas: HashMap::new(),
            resumes: Vec::new(),
            monthly_reviews: Vec::new(),
            half_year_reviews: Vec::new(),
        }
    }

    pub fn with_personas(mut self, personas: HashMap<String, Persona>) -> Self {
        self.personas = personas;
        self
    }

    pub fn with_resumes(mut self, resumes: Vec<(String, String)>) -> Self {
        self.resumes = resumes;
        self
    }

    pub fn with_reviews(mut self, monthly: Vec<Value>, half_year: Vec<Value>) -> Self {
        self.monthly_reviews = monthly;
        self.half_year_reviews = half_year;
        self
    }

    pub fn list_all(&self) -> &[EmployeeRecord] {
        &self.employees
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn find(&self, employee_id: &str) -> Option<&EmployeeRecord> {
        self.employees.iter().find(|e| e.employee_id == employee_id)
    }

    pub fn persona_for(&self, employee_id: &str) -> Option<&Persona> {
        self.personas.get(employee_id)
    }

    /// Resolves the resume text snapshot for an employee. Filenames follow
    /// the `EMP{id}_*` convention; anything merely containing the id is
    /// accepted as a fallback.
    pub fn resume_text_for(&self, employee_id: &str) -> Option<&str> {
        if employee_id.is_empty() {
            return None;
        }
        let prefix = format!("EMP{employee_id}_");
        self.resumes
            .iter()
            .find(|(stem, _)| stem.starts_with(&prefix))
            .or_else(|| self.resumes.iter().find(|(stem, _)| stem.contains(employee_id)))
            .map(|(_, text)| text.as_str())
    }

    /// Most recent monthly and half-year reviews for an employee.
    pub fn reviews_for(&self, employee_id: &str) -> ReviewBundle {
        ReviewBundle {
            monthly: latest_review(&self.monthly_reviews, employee_id, &["year_month"]),
            half_year: latest_review(
                &self.half_year_reviews,
                employee_id,
                &["cycle_start_date", "upload_year_month"],
            ),
        }
    }

    /// Scores every record against a free-text query: exact id, id fragment,
    /// then name, mail, title, and department fragments, in that order.
    pub fn search_people(&self, query: &str) -> Vec<(f64, &EmployeeRecord)> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for emp in &self.employees {
            let id = emp.employee_id.to_lowercase();
            let score = if q == id {
                1.0
            } else if id.contains(&q) {
                0.9
            } else if field_contains(&emp.employee_name, &q) {
                0.8
            } else if field_contains(&emp.mail, &q) {
                0.7
            } else if field_contains(&emp.job_title, &q) {
                0.6
            } else if field_contains(&emp.dept_1, &q)
                || field_contains(&emp.dept_2, &q)
                || field_contains(&emp.dept_3, &q)
                || field_contains(&emp.dept_4, &q)
            {
                0.5
            } else {
                continue;
            };
            results.push((score, emp));
        }

        results.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        results
    }
}

fn field_contains(field: &Option<String>, query: &str) -> bool {
    field
        .as_deref()
        .map(|v| v.to_lowercase().contains(query))
        .unwrap_or(false)
}

fn review_sort_key<'a>(review: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .filter_map(|k| review.get(k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

fn latest_review(reviews: &[Value], employee_id: &str, keys: &[&str]) -> Option<Value> {
    reviews
        .iter()
        .filter(|r| r.get("employee_id").and_then(Value::as_str) == Some(employee_id))
        .max_by(|a, b| review_sort_key(a, keys).cmp(review_sort_key(b, keys)))
        .cloned()
}
