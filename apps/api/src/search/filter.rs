//! Stage 2 — Candidate Filter Engine.
//!
//! Pure, synchronous, total over valid input: one pass over the store in
//! order, an AND-chain of predicates with short-circuit on first failure.
//! Department and title matching is deliberately loose — domain-adjacent
//! departments and same-family titles survive even when the strings differ.

use chrono::NaiveDate;

use crate::errors::AppError;
use crate::search::models::{
    DateRangeFilter, FilterStats, HardFilterSpec, UserFilterOverrides,
};
use crate::store::models::EmployeeRecord;
use crate::store::RecordStore;

/// Hard cap on the candidate list handed to the evaluation stage.
const CANDIDATE_CAP: usize = 50;

/// Tokens that mark a department as belonging to the AI/data domain.
/// Two departments count as related when both contain one of these.
const RELATED_DOMAIN_KEYWORDS: &[&str] = &[
    "ai",
    "機械学習",
    "データ",
    "ml",
    "データサイエンス",
    "ai推進",
    "aiアクセラレーション",
];

/// Title keywords grouped by role type; a keyword shared between the
/// candidate's title and an allowed title counts as a similar role.
const ENGINEER_TITLE_KEYWORDS: &[&str] = &["エンジニア", "engineer"];
const DATA_TITLE_KEYWORDS: &[&str] = &["データ", "data", "サイエンティスト", "scientist"];
const AI_TITLE_KEYWORDS: &[&str] = &[
    "ai",
    "ml",
    "機械学習",
    "machine learning",
    "aiエンジニア",
    "mlエンジニア",
];

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub candidate_ids: Vec<String>,
    pub stats: FilterStats,
    pub sql_query: String,
}

/// Applies the hard filters and user overrides to every record in the store.
///
/// `today` is injected so tenure-derived predicates stay deterministic under
/// test; production callers pass the current date. The returned id list is
/// capped at 50, but `stats.kept` counts every survivor of the full pass.
pub fn filter_candidates(
    store: &RecordStore,
    spec: &HardFilterSpec,
    target_employee_id: &str,
    overrides: Option<&UserFilterOverrides>,
    today: NaiveDate,
) -> Result<FilterOutcome, AppError> {
    if store.is_empty() {
        return Err(AppError::NotFound("No employee data available".to_string()));
    }

    let mut survivors = Vec::new();
    for emp in store.list_all() {
        if emp.employee_id == target_employee_id {
            continue;
        }
        if !passes_hard_filters(emp, spec) {
            continue;
        }
        if let Some(overrides) = overrides {
            if !passes_overrides(emp, overrides, today) {
                continue;
            }
        }
        survivors.push(emp.employee_id.clone());
    }

    let total = store.len();
    let kept = survivors.len();
    let elimination_rate = ((total - kept) as f64 / total as f64 * 1000.0).round() / 10.0;
    survivors.truncate(CANDIDATE_CAP);

    Ok(FilterOutcome {
        sql_query: render_query_trace(spec, target_employee_id),
        candidate_ids: survivors,
        stats: FilterStats {
            total,
            kept,
            elimination_rate,
        },
    })
}

fn passes_hard_filters(emp: &EmployeeRecord, spec: &HardFilterSpec) -> bool {
    if !spec.current_employee_flag.is_empty()
        && emp.current_employee_flag.as_deref() != Some(spec.current_employee_flag.as_str())
    {
        return false;
    }

    if let Some(family) = spec.job_family.as_deref().filter(|f| !f.is_empty()) {
        if emp.job_family.as_deref() != Some(family) {
            return false;
        }
    }

    if let Some(depts) = spec.dept_3.as_deref().filter(|d| !d.is_empty()) {
        if !dept_matches(emp.dept_3.as_deref().unwrap_or(""), depts) {
            return false;
        }
    }

    if let Some(titles) = spec.job_title.as_deref().filter(|t| !t.is_empty()) {
        let family_matched = matches!(
            (spec.job_family.as_deref(), emp.job_family.as_deref()),
            (Some(spec_family), Some(emp_family))
                if !spec_family.is_empty() && spec_family == emp_family
        );
        if !title_matches(emp.job_title.as_deref().unwrap_or(""), titles, family_matched) {
            return false;
        }
    }

    if let Some(min_years) = spec.years_of_service_min.filter(|m| *m > 0) {
        // Fail-open: an unknown length of service cannot be proven too short.
        if let Some(years) = leading_service_years(emp.years_of_service.as_deref().unwrap_or(""))
        {
            if years < min_years {
                return false;
            }
        }
    }

    true
}

/// Exact containment in the allowed set, or domain adjacency: some related
/// keyword appears in both the candidate department and an allowed entry.
fn dept_matches(dept: &str, allowed: &[String]) -> bool {
    if allowed.iter().any(|d| d == dept) {
        return true;
    }
    let dept_lower = dept.to_lowercase();
    allowed.iter().any(|entry| {
        let entry_lower = entry.to_lowercase();
        RELATED_DOMAIN_KEYWORDS
            .iter()
            .any(|kw| dept_lower.contains(kw) && entry_lower.contains(kw))
    })
}

/// Exact containment, a shared role keyword with any allowed title, or an
/// unconditional pass when the spec's job_family already matched exactly —
/// family equality is sufficient evidence of role similarity.
fn title_matches(title: &str, allowed: &[String], family_matched: bool) -> bool {
    if allowed.iter().any(|t| t == title) {
        return true;
    }
    if family_matched {
        return true;
    }
    let title_lower = title.to_lowercase();
    allowed.iter().any(|entry| {
        let entry_lower = entry.to_lowercase();
        shares_keyword(&title_lower, &entry_lower, ENGINEER_TITLE_KEYWORDS)
            || shares_keyword(&title_lower, &entry_lower, DATA_TITLE_KEYWORDS)
            || shares_keyword(&title_lower, &entry_lower, AI_TITLE_KEYWORDS)
    })
}

fn shares_keyword(a: &str, b: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| a.contains(kw) && b.contains(kw))
}

/// Extracts the leading year count from a free-text duration such as
/// "3年2ヵ月" or "3 years 2 months". None when no year marker is present.
fn leading_service_years(raw: &str) -> Option<i64> {
    let marker = raw.find('年').or_else(|| raw.find("year"))?;
    let digits: Vec<char> = raw[..marker]
        .chars()
        .rev()
        .skip_while(|c| c.is_whitespace())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.iter().rev().collect::<String>().parse().ok()
}

// ────────────────────────────────────────────────────────────────────────────
// User filter overrides
// ────────────────────────────────────────────────────────────────────────────

type DateRange = (Option<NaiveDate>, Option<NaiveDate>);

fn passes_overrides(
    emp: &EmployeeRecord,
    overrides: &UserFilterOverrides,
    today: NaiveDate,
) -> bool {
    if let Some(gender) = &overrides.gender {
        if gender.male || gender.female {
            let matched = match emp.gender.as_deref() {
                Some("男") => gender.male,
                Some("女") => gender.female,
                _ => false,
            };
            if !matched {
                return false;
            }
        }
    }

    if let Some(buckets) = &overrides.experience {
        if buckets.less_than_3 || buckets.less_than_5 || buckets.more_than_5 {
            let years = tenure_years(emp.entered_at.as_deref(), today);
            let matched = (buckets.less_than_3 && years < 3.0)
                || (buckets.less_than_5 && years < 5.0)
                || (buckets.more_than_5 && years >= 5.0);
            if !matched {
                return false;
            }
        }
    }

    if let Some(range) = active_range(&overrides.join_date) {
        if let Some(entered) = parse_date(emp.entered_at.as_deref()) {
            if outside(entered, range) {
                return false;
            }
        }
    }

    if let Some(range) = active_range(&overrides.birth_date) {
        if let Some(birthday) = parse_date(emp.birthday.as_deref()) {
            if outside(birthday, range) {
                return false;
            }
        }
    }

    if let Some((from, to)) = active_range(&overrides.employment_period) {
        if let Some(entered) = parse_date(emp.entered_at.as_deref()) {
            let left = parse_date(emp.retired_at.as_deref()).unwrap_or(today);
            if from.is_some_and(|f| entered < f) {
                return false;
            }
            if to.is_some_and(|t| left > t) {
                return false;
            }
        }
    }

    if let Some(range) = active_range(&overrides.departure_date) {
        match emp.retired_at.as_deref() {
            // The one override that requires its date to exist: a bound on
            // the departure date can never match a still-employed record.
            None => return false,
            Some(raw) => {
                if let Some(retired) = parse_date(Some(raw)) {
                    if outside(retired, range) {
                        return false;
                    }
                }
            }
        }
    }

    true
}

/// Returns the parsed bounds when the filter is present, not opted out, and
/// carries at least one usable bound.
fn active_range(filter: &Option<DateRangeFilter>) -> Option<DateRange> {
    let filter = filter.as_ref()?;
    if filter.no_input {
        return None;
    }
    let from = parse_date(filter.from.as_deref());
    let to = parse_date(filter.to.as_deref());
    if from.is_none() && to.is_none() {
        return None;
    }
    Some((from, to))
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw?, "%Y-%m-%d").ok()
}

fn outside(date: NaiveDate, (from, to): DateRange) -> bool {
    from.is_some_and(|f| date < f) || to.is_some_and(|t| date > t)
}

/// Derived tenure in years, rounded to two decimals; 0.0 when the join date
/// is missing or malformed.
fn tenure_years(entered_at: Option<&str>, today: NaiveDate) -> f64 {
    let Some(entered) = parse_date(entered_at) else {
        return 0.0;
    };
    let days = (today - entered).num_days();
    (days as f64 / 365.25 * 100.0).round() / 100.0
}

/// SQL-like rendering of the applied spec. Informational only — nothing
/// executes it.
fn render_query_trace(spec: &HardFilterSpec, target_employee_id: &str) -> String {
    let depts = spec
        .dept_3
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|d| format!("'{d}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT * FROM employees\nWHERE current_employee_flag = '{}'\n  AND employee_id != '{}'\n  AND job_family = '{}'\n  AND dept_3 IN ({})\nLIMIT {}",
        spec.current_employee_flag,
        target_employee_id,
        spec.job_family.as_deref().unwrap_or(""),
        depts,
        CANDIDATE_CAP,
    )
}
