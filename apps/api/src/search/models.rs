//! Wire and domain types for the three-stage search funnel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::models::EmployeeRecord;

/// The sentinel the snapshot uses to mark an active employee.
pub const ACTIVE_EMPLOYEE_FLAG: &str = "●";

/// Response language for prompts and thinking text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
}

fn default_employee_flag() -> String {
    ACTIVE_EMPLOYEE_FLAG.to_string()
}

/// Structural predicate over employee record fields. Produced by the
/// analyzer; the caller may edit it before the filtering stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardFilterSpec {
    #[serde(default)]
    pub job_family: Option<String>,
    #[serde(default)]
    pub dept_3: Option<Vec<String>>,
    #[serde(default)]
    pub job_title: Option<Vec<String>>,
    #[serde(default)]
    pub years_of_service_min: Option<i64>,
    #[serde(default = "default_employee_flag")]
    pub current_employee_flag: String,
}

impl Default for HardFilterSpec {
    fn default() -> Self {
        Self {
            job_family: None,
            dept_3: None,
            job_title: None,
            years_of_service_min: None,
            current_employee_flag: default_employee_flag(),
        }
    }
}

/// Descriptive criteria used only as ranking context — never mechanically
/// matched against record fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoftCriteriaSpec {
    #[serde(default)]
    pub key_skills: Vec<String>,
    #[serde(default)]
    pub domain_expertise: Vec<String>,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub role_alignment: String,
    #[serde(default)]
    pub preferred_departments: Vec<String>,
}

/// Parsed analyzer output: the two filter layers plus the narration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub hard_filters: HardFilterSpec,
    #[serde(default)]
    pub soft_criteria: SoftCriteriaSpec,
    #[serde(default)]
    pub thinking_text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Stage request/response bodies
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub target_employee: Value,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub search_id: String,
    pub stage: String,
    pub thinking_text: String,
    pub analysis_result: AnalysisResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterRequest {
    pub search_id: String,
    pub hard_filters: HardFilterSpec,
    pub target_employee_id: String,
    #[serde(default)]
    pub user_filters: Option<UserFilterOverrides>,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FilterStats {
    pub total: usize,
    pub kept: usize,
    /// Percentage of the roster eliminated, rounded to one decimal.
    pub elimination_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterResponse {
    pub stage: String,
    pub thinking_text: String,
    pub stats: FilterStats,
    pub candidate_ids: Vec<String>,
    pub sql_query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    pub search_id: String,
    pub target_employee: Value,
    pub candidate_ids: Vec<String>,
    #[serde(default)]
    pub soft_criteria: SoftCriteriaSpec,
    #[serde(default)]
    pub language: Language,
}

// ────────────────────────────────────────────────────────────────────────────
// User filter overrides (modal payload, camelCase on the wire)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilterOverrides {
    #[serde(default)]
    pub gender: Option<GenderToggles>,
    #[serde(default)]
    pub experience: Option<ExperienceBuckets>,
    #[serde(default)]
    pub join_date: Option<DateRangeFilter>,
    #[serde(default)]
    pub birth_date: Option<DateRangeFilter>,
    #[serde(default)]
    pub employment_period: Option<DateRangeFilter>,
    #[serde(default)]
    pub departure_date: Option<DateRangeFilter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenderToggles {
    #[serde(default)]
    pub male: bool,
    #[serde(default)]
    pub female: bool,
}

/// Coarse tenure buckets; enabled buckets are OR-combined.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceBuckets {
    #[serde(default)]
    pub less_than_3: bool,
    #[serde(default)]
    pub less_than_5: bool,
    #[serde(default)]
    pub more_than_5: bool,
}

/// Inclusive date range with an explicit "no constraint" escape flag.
/// Bounds stay as raw `YYYY-MM-DD` strings; unparseable values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeFilter {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub no_input: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation output
// ────────────────────────────────────────────────────────────────────────────

/// Five-axis similarity scores, each an integer in [0, 100].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvaluationScores {
    pub technical_skills: u8,
    pub domain_expertise: u8,
    pub experience_level: u8,
    pub role_alignment: u8,
    pub soft_skills: u8,
    pub overall: u8,
}

impl EvaluationScores {
    /// Clamps every axis into the 0–100 contract range.
    pub fn clamped(self) -> Self {
        Self {
            technical_skills: self.technical_skills.min(100),
            domain_expertise: self.domain_expertise.min(100),
            experience_level: self.experience_level.min(100),
            role_alignment: self.role_alignment.min(100),
            soft_skills: self.soft_skills.min(100),
            overall: self.overall.min(100),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub scores: EvaluationScores,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

/// Four-axis performance/growth alignment scores from the review call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReviewScores {
    pub performance: u8,
    pub growth: u8,
    pub collaboration: u8,
    pub consistency: u8,
    pub overall: u8,
}

impl ReviewScores {
    pub fn clamped(self) -> Self {
        Self {
            performance: self.performance.min(100),
            growth: self.growth.min(100),
            collaboration: self.collaboration.min(100),
            consistency: self.consistency.min(100),
            overall: self.overall.min(100),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewEvaluation {
    pub scores: ReviewScores,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub candidate: EmployeeRecord,
    pub evaluation: CandidateEvaluation,
}

/// Events of the evaluation stream, in SSE wire shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RankEvent {
    Progress {
        current: usize,
        total: usize,
    },
    Complete {
        thinking_text: String,
        top_3_candidates: Vec<RankedCandidate>,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// People search (roster lookup surface)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PersonSummary {
    pub employee_id: String,
    pub employee_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dept_1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dept_2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl PersonSummary {
    pub fn from_record(record: &EmployeeRecord) -> Self {
        Self {
            employee_id: record.employee_id.clone(),
            employee_name: record.employee_name.clone().unwrap_or_default(),
            mail: record.mail.clone(),
            job_title: record.job_title.clone(),
            dept_1: record.dept_1.clone(),
            dept_2: record.dept_2.clone(),
            location: record.location.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PeopleSearchItem {
    pub person: PersonSummary,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_filter_spec_defaults_to_active_flag() {
        let spec: HardFilterSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.current_employee_flag, ACTIVE_EMPLOYEE_FLAG);
        assert!(spec.job_family.is_none());
        assert!(spec.years_of_service_min.is_none());
    }

    #[test]
    fn test_soft_criteria_accepts_empty_object() {
        let criteria: SoftCriteriaSpec = serde_json::from_str("{}").unwrap();
        assert!(criteria.key_skills.is_empty());
        assert!(criteria.experience_level.is_empty());
    }

    #[test]
    fn test_language_defaults_to_japanese() {
        assert_eq!(Language::default(), Language::Ja);
        let lang: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(lang, Language::En);
    }

    #[test]
    fn test_user_filters_parse_camel_case_payload() {
        let raw = r#"{
            "gender": {"male": true, "female": false},
            "experience": {"lessThan3": true, "moreThan5": true},
            "joinDate": {"from": "2020-01-01", "to": "2023-12-31", "noInput": false},
            "departureDate": {"noInput": true}
        }"#;
        let overrides: UserFilterOverrides = serde_json::from_str(raw).unwrap();

        assert!(overrides.gender.as_ref().unwrap().male);
        let buckets = overrides.experience.unwrap();
        assert!(buckets.less_than_3 && buckets.more_than_5 && !buckets.less_than_5);
        assert_eq!(
            overrides.join_date.unwrap().from.as_deref(),
            Some("2020-01-01")
        );
        assert!(overrides.departure_date.unwrap().no_input);
    }

    #[test]
    fn test_rank_event_wire_shape() {
        let progress = serde_json::to_value(RankEvent::Progress { current: 2, total: 5 }).unwrap();
        assert_eq!(progress["type"], "progress");
        assert_eq!(progress["current"], 2);

        let complete = serde_json::to_value(RankEvent::Complete {
            thinking_text: "done".to_string(),
            top_3_candidates: vec![],
        })
        .unwrap();
        assert_eq!(complete["type"], "complete");
        assert!(complete["top_3_candidates"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_evaluation_scores_clamp_to_contract_range() {
        let scores = EvaluationScores {
            technical_skills: 120,
            domain_expertise: 100,
            experience_level: 99,
            role_alignment: 101,
            soft_skills: 0,
            overall: 255,
        }
        .clamped();
        assert_eq!(scores.technical_skills, 100);
        assert_eq!(scores.role_alignment, 100);
        assert_eq!(scores.overall, 100);
        assert_eq!(scores.experience_level, 99);
    }

    #[test]
    fn test_analysis_result_tolerates_sparse_reply() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"hard_filters": {"job_family": "Engineer"}}"#).unwrap();
        assert_eq!(result.hard_filters.job_family.as_deref(), Some("Engineer"));
        assert_eq!(result.hard_filters.current_employee_flag, ACTIVE_EMPLOYEE_FLAG);
        assert!(result.soft_criteria.key_skills.is_empty());
        assert!(result.thinking_text.is_empty());
    }
}
