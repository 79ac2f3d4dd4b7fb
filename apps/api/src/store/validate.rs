//! Snapshot validation — the store invariants must hold before the process
//! starts serving. Hard violations abort startup; shape oddities that do
//! not break the funnel are logged as warnings.

use std::collections::HashSet;

use tracing::warn;

use super::models::EmployeeRecord;

const DATE_FIELDS: &[&str] = &["entered_at", "last_day_at", "retired_at", "birthday"];

/// Checks every record against the snapshot invariants and returns the list
/// of hard violations. An empty snapshot is valid.
pub fn validate_employees(employees: &[EmployeeRecord]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for (idx, emp) in employees.iter().enumerate() {
        let id = emp.employee_id.as_str();
        let label = if id.trim().is_empty() {
            format!("<record at index {idx}>")
        } else {
            id.to_string()
        };

        if id.trim().is_empty() {
            errors.push(format!("Employee {label}: missing required field 'employee_id'"));
        } else if !seen_ids.insert(id) {
            errors.push(format!("Employee {label}: duplicate employee_id"));
        }

        if emp
            .employee_name
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .is_empty()
        {
            errors.push(format!("Employee {label}: missing required field 'employee_name'"));
        }

        for (field, value) in date_fields(emp) {
            if let Some(value) = value {
                if value.len() != 10 || value.matches('-').count() != 2 {
                    warn!("Employee {label}: '{field}' may not be in YYYY-MM-DD format: {value}");
                }
            }
        }

        if let Some(dept_name) = &emp.dept_name {
            if dept_name.matches('>').count() > 5 {
                warn!("Employee {label}: dept_name has more than 6 levels (max recommended)");
            }
        }

        if let Some(flag) = &emp.current_employee_flag {
            if flag != "●" && !flag.is_empty() {
                warn!(
                    "Employee {label}: current_employee_flag should be '●' or empty, got '{flag}'"
                );
            }
        }
    }

    errors
}

fn date_fields(emp: &EmployeeRecord) -> impl Iterator<Item = (&'static str, Option<&str>)> {
    [
        emp.entered_at.as_deref(),
        emp.last_day_at.as_deref(),
        emp.retired_at.as_deref(),
        emp.birthday.as_deref(),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, value)| (DATE_FIELDS[i], value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: Option<&str>) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            employee_name: name.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_snapshot_has_no_errors() {
        let employees = vec![record("1001", Some("田中太郎")), record("1002", Some("鈴木花子"))];
        assert!(validate_employees(&employees).is_empty());
    }

    #[test]
    fn test_empty_snapshot_is_valid() {
        assert!(validate_employees(&[]).is_empty());
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let employees = vec![record("1001", None)];
        let errors = validate_employees(&employees);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("employee_name"));
    }

    #[test]
    fn test_blank_name_is_an_error() {
        let employees = vec![record("1001", Some("  "))];
        assert_eq!(validate_employees(&employees).len(), 1);
    }

    #[test]
    fn test_duplicate_id_is_an_error() {
        let employees = vec![record("1001", Some("A")), record("1001", Some("B"))];
        let errors = validate_employees(&employees);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("duplicate"));
    }

    #[test]
    fn test_empty_id_is_an_error() {
        let employees = vec![record("", Some("A"))];
        let errors = validate_employees(&employees);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("employee_id"));
    }

    #[test]
    fn test_odd_date_shape_is_only_a_warning() {
        let mut emp = record("1001", Some("A"));
        emp.entered_at = Some("2020/04/01".to_string());
        assert!(validate_employees(&[emp]).is_empty());
    }
}
