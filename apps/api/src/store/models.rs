use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of the employee snapshot.
///
/// The typed fields are the ones the funnel actually reads. Everything else
/// the snapshot carries (history arrays, FFS factors, …) stays opaque in
/// `extra` and round-trips through serialization untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Missing ids deserialize as empty and are rejected by snapshot
    /// validation, which reports every violation instead of the first.
    #[serde(default)]
    pub employee_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_employee_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entered_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_day_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retired_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept_1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept_3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept_4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept_5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept_6: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_family: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Structured skills/career summary for one employee, independent of the
/// free-text resume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Most recent performance reviews for one employee. Absence of either
/// table entry is normal — it just reduces ranking context.
#[derive(Debug, Clone, Default)]
pub struct ReviewBundle {
    pub monthly: Option<Value>,
    pub half_year: Option<Value>,
}

impl ReviewBundle {
    pub fn has_any(&self) -> bool {
        self.monthly.is_some() || self.half_year.is_some()
    }
}
