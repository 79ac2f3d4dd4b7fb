//! Stage 3 — Candidate Ranker.
//!
//! Scores each candidate's resume against the soft criteria with one LLM
//! call, optionally blends in a second review-alignment call, and yields a
//! progress event per candidate followed by the ranked top 3.
//!
//! Candidates are processed strictly sequentially. Per-candidate failures
//! are contained: the candidate drops out of the ranking, the progress
//! counter still advances, and the batch continues.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm_gateway::{send_json, ChatMessage, GatewayError, LlmGateway};
use crate::search::models::{
    CandidateEvaluation, EvaluateRequest, Language, RankEvent, RankedCandidate, ReviewEvaluation,
    SoftCriteriaSpec,
};
use crate::search::prompts;
use crate::store::models::{EmployeeRecord, ReviewBundle};
use crate::store::RecordStore;

/// Cost-control cap on how many candidates one run evaluates.
const EVALUATION_BATCH_CAP: usize = 30;
/// Character budget for resume excerpts embedded in prompts.
const RESUME_EXCERPT_CHARS: usize = 500;
/// Character budget for review excerpts embedded in prompts.
const REVIEW_EXCERPT_CHARS: usize = 800;
/// Pause between candidates so the sequential calls stay under provider
/// rate limits. Pacing policy, not a correctness requirement.
const PACING_DELAY: Duration = Duration::from_millis(300);
const EVALUATION_TEMPERATURE: f32 = 0.2;
/// Assembly-time caps on the free-text lists.
const MAX_STRENGTHS: usize = 3;
const MAX_GAPS: usize = 2;

/// Runs the evaluation batch, yielding `Progress` after each candidate
/// concludes and one final `Complete` with the ranked top 3.
pub fn rank_candidates(
    store: Arc<RecordStore>,
    llm: Arc<dyn LlmGateway>,
    request: EvaluateRequest,
) -> impl Stream<Item = RankEvent> {
    stream! {
        let candidate_ids: Vec<String> = request
            .candidate_ids
            .iter()
            .take(EVALUATION_BATCH_CAP)
            .cloned()
            .collect();
        let total = candidate_ids.len();
        let language = request.language;

        let target_id = request
            .target_employee
            .get("employee_id")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let target = target_context(&store, &request.target_employee, &target_id);
        let target_reviews = store.reviews_for(&target_id);

        let mut evaluations: Vec<(EmployeeRecord, CandidateEvaluation)> = Vec::new();

        for (idx, candidate_id) in candidate_ids.iter().enumerate() {
            let current = idx + 1;

            let candidate = match store.find(candidate_id) {
                Some(candidate) => candidate.clone(),
                None => {
                    warn!("Candidate {candidate_id} not found in store, skipping");
                    yield RankEvent::Progress { current, total };
                    continue;
                }
            };

            match evaluate_candidate(
                &store,
                llm.as_ref(),
                &request.soft_criteria,
                &target,
                &target_reviews,
                &candidate,
                language,
            )
            .await
            {
                Ok(evaluation) => evaluations.push((candidate, evaluation)),
                Err(err) => warn!("Failed to evaluate {candidate_id}: {err}"),
            }

            yield RankEvent::Progress { current, total };
            tokio::time::sleep(PACING_DELAY).await;
        }

        // Stable descending sort: ties keep first-seen order.
        evaluations.sort_by(|a, b| b.1.scores.overall.cmp(&a.1.scores.overall));

        let evaluated = evaluations.len();
        let top_3_candidates = evaluations
            .into_iter()
            .take(3)
            .enumerate()
            .map(|(i, (candidate, evaluation))| RankedCandidate {
                rank: i + 1,
                candidate,
                evaluation,
            })
            .collect();

        let thinking_text = match language {
            Language::En => format!(
                "Resume analysis complete. Evaluated {evaluated} candidates and selected the top 3 most similar employees."
            ),
            Language::Ja => format!(
                "レジュメ分析が完了しました。{evaluated}人の候補者を評価し、最も類似した3人を選出しました。"
            ),
        };

        yield RankEvent::Complete {
            thinking_text,
            top_3_candidates,
        };
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Per-candidate evaluation
// ────────────────────────────────────────────────────────────────────────────

/// Prompt-ready view of one party (target or candidate).
struct PartyContext {
    name: String,
    job_title: String,
    dept: String,
    skills: String,
    resume: String,
}

fn target_context(store: &RecordStore, target: &Value, target_id: &str) -> PartyContext {
    PartyContext {
        name: text_field(target, "employee_name"),
        job_title: text_field(target, "job_title"),
        dept: format!(
            "{} / {}",
            text_field(target, "dept_3"),
            text_field(target, "dept_4")
        ),
        skills: skills_line(store, target_id),
        resume: resume_excerpt(store, target_id),
    }
}

fn candidate_context(store: &RecordStore, record: &EmployeeRecord) -> PartyContext {
    PartyContext {
        name: record.employee_name.clone().unwrap_or_default(),
        job_title: record.job_title.clone().unwrap_or_default(),
        dept: format!(
            "{} / {}",
            record.dept_3.clone().unwrap_or_default(),
            record.dept_4.clone().unwrap_or_default()
        ),
        skills: skills_line(store, &record.employee_id),
        resume: resume_excerpt(store, &record.employee_id),
    }
}

fn text_field(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn skills_line(store: &RecordStore, employee_id: &str) -> String {
    store
        .persona_for(employee_id)
        .map(|p| {
            p.skills
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn resume_excerpt(store: &RecordStore, employee_id: &str) -> String {
    store
        .resume_text_for(employee_id)
        .map(|t| t.chars().take(RESUME_EXCERPT_CHARS).collect())
        .unwrap_or_default()
}

async fn evaluate_candidate(
    store: &RecordStore,
    llm: &dyn LlmGateway,
    criteria: &SoftCriteriaSpec,
    target: &PartyContext,
    target_reviews: &ReviewBundle,
    candidate: &EmployeeRecord,
    language: Language,
) -> Result<CandidateEvaluation, GatewayError> {
    let candidate_ctx = candidate_context(store, candidate);

    let messages = resume_messages(language, target, &candidate_ctx, criteria);
    let parsed: CandidateEvaluation =
        send_json(llm, &messages, EVALUATION_TEMPERATURE).await?;
    let mut evaluation = assemble(parsed);

    let candidate_reviews = store.reviews_for(&candidate.employee_id);
    if target_reviews.has_any() || candidate_reviews.has_any() {
        let messages = review_messages(language, target, &candidate_ctx, target_reviews, &candidate_reviews);
        match send_json::<ReviewEvaluation>(llm, &messages, EVALUATION_TEMPERATURE).await {
            Ok(review) => blend_review(&mut evaluation, review),
            // Best effort: a failed review call leaves the resume-only
            // evaluation unchanged.
            Err(err) => debug!(
                "Review scoring skipped for {}: {err}",
                candidate.employee_id
            ),
        }
    }

    Ok(evaluation)
}

/// Enforces the output contract on a parsed reply: scores clamped into
/// [0, 100], at most 3 strengths and 2 gaps.
fn assemble(mut evaluation: CandidateEvaluation) -> CandidateEvaluation {
    evaluation.scores = evaluation.scores.clamped();
    evaluation.strengths.truncate(MAX_STRENGTHS);
    evaluation.gaps.truncate(MAX_GAPS);
    evaluation
}

/// Folds a successful review evaluation into the resume evaluation:
/// 70/30 blended overall, review strengths/gaps appended under the caps,
/// explanations concatenated.
fn blend_review(evaluation: &mut CandidateEvaluation, review: ReviewEvaluation) {
    let review_scores = review.scores.clamped();
    let blended =
        f64::from(evaluation.scores.overall) * 0.7 + f64::from(review_scores.overall) * 0.3;
    evaluation.scores.overall = blended.round() as u8;

    evaluation.strengths.extend(review.strengths);
    evaluation.strengths.truncate(MAX_STRENGTHS);
    evaluation.gaps.extend(review.gaps);
    evaluation.gaps.truncate(MAX_GAPS);

    if !review.explanation.is_empty() {
        if evaluation.explanation.is_empty() {
            evaluation.explanation = review.explanation;
        } else {
            evaluation.explanation =
                format!("{} {}", evaluation.explanation, review.explanation);
        }
    }
}

fn resume_messages(
    language: Language,
    target: &PartyContext,
    candidate: &PartyContext,
    criteria: &SoftCriteriaSpec,
) -> [ChatMessage; 2] {
    let (system, template) = match language {
        Language::En => (prompts::EVALUATION_SYSTEM_EN, prompts::EVALUATION_USER_EN),
        Language::Ja => (prompts::EVALUATION_SYSTEM_JA, prompts::EVALUATION_USER_JA),
    };
    let user = template
        .replace("{target_name}", &target.name)
        .replace("{target_title}", &target.job_title)
        .replace("{target_dept}", &target.dept)
        .replace("{target_skills}", &target.skills)
        .replace("{target_resume}", &target.resume)
        .replace("{key_skills}", &criteria.key_skills.join(", "))
        .replace("{domain_expertise}", &criteria.domain_expertise.join(", "))
        .replace("{experience_level}", &criteria.experience_level)
        .replace("{candidate_name}", &candidate.name)
        .replace("{candidate_title}", &candidate.job_title)
        .replace("{candidate_dept}", &candidate.dept)
        .replace("{candidate_skills}", &candidate.skills)
        .replace("{candidate_resume}", &candidate.resume);
    [ChatMessage::system(system), ChatMessage::user(user)]
}

fn review_messages(
    language: Language,
    target: &PartyContext,
    candidate: &PartyContext,
    target_reviews: &ReviewBundle,
    candidate_reviews: &ReviewBundle,
) -> [ChatMessage; 2] {
    let (system, template) = match language {
        Language::En => (prompts::REVIEW_SYSTEM_EN, prompts::REVIEW_USER_EN),
        Language::Ja => (prompts::REVIEW_SYSTEM_JA, prompts::REVIEW_USER_JA),
    };
    let user = template
        .replace("{target_name}", &target.name)
        .replace("{target_reviews}", &review_excerpt(target_reviews))
        .replace("{candidate_name}", &candidate.name)
        .replace("{candidate_reviews}", &review_excerpt(candidate_reviews));
    [ChatMessage::system(system), ChatMessage::user(user)]
}

fn review_excerpt(bundle: &ReviewBundle) -> String {
    let mut parts = Vec::new();
    if let Some(monthly) = &bundle.monthly {
        parts.push(monthly.to_string());
    }
    if let Some(half_year) = &bundle.half_year {
        parts.push(half_year.to_string());
    }
    if parts.is_empty() {
        return "-".to_string();
    }
    parts.join("\n").chars().take(REVIEW_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use serde_json::json;

    use super::*;
    use crate::llm_gateway::testing::ScriptedGateway;
    use crate::search::models::ACTIVE_EMPLOYEE_FLAG;

    fn record(id: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            employee_name: Some(format!("社員{id}")),
            current_employee_flag: Some(ACTIVE_EMPLOYEE_FLAG.to_string()),
            ..Default::default()
        }
    }

    fn store_with(ids: &[&str]) -> Arc<RecordStore> {
        Arc::new(RecordStore::new(ids.iter().map(|id| record(id)).collect()))
    }

    fn request(candidate_ids: &[&str]) -> EvaluateRequest {
        EvaluateRequest {
            search_id: "s-1".to_string(),
            target_employee: json!({"employee_id": "T1", "employee_name": "ターゲット"}),
            candidate_ids: candidate_ids.iter().map(|s| s.to_string()).collect(),
            soft_criteria: SoftCriteriaSpec::default(),
            language: Language::Ja,
        }
    }

    fn resume_reply(overall: u8) -> String {
        json!({
            "scores": {
                "technical_skills": overall,
                "domain_expertise": overall,
                "experience_level": overall,
                "role_alignment": overall,
                "soft_skills": overall,
                "overall": overall
            },
            "strengths": ["強み1"],
            "gaps": ["ギャップ1"],
            "explanation": "説明。"
        })
        .to_string()
    }

    fn review_reply(overall: u8) -> String {
        json!({
            "scores": {
                "performance": overall,
                "growth": overall,
                "collaboration": overall,
                "consistency": overall,
                "overall": overall
            },
            "strengths": ["レビュー強み"],
            "gaps": [],
            "explanation": "レビュー所見。"
        })
        .to_string()
    }

    async fn collect(
        store: Arc<RecordStore>,
        gateway: ScriptedGateway,
        request: EvaluateRequest,
    ) -> Vec<RankEvent> {
        rank_candidates(store, Arc::new(gateway), request)
            .collect()
            .await
    }

    fn complete_event(events: &[RankEvent]) -> (&str, &[RankedCandidate]) {
        match events.last().expect("stream yields events") {
            RankEvent::Complete {
                thinking_text,
                top_3_candidates,
            } => (thinking_text.as_str(), top_3_candidates.as_slice()),
            other => panic!("last event should be complete, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_advances_once_per_candidate() {
        let store = store_with(&["C1", "C2", "C3", "C4", "C5"]);
        let replies: Vec<String> = vec![
            resume_reply(50),
            "not json at all".to_string(), // C2 drops, progress still advances
            resume_reply(60),
            resume_reply(70),
            resume_reply(80),
        ];
        let gateway =
            ScriptedGateway::replying(&replies.iter().map(String::as_str).collect::<Vec<_>>());

        let events = collect(store, gateway, request(&["C1", "C2", "C3", "C4", "C5"])).await;

        assert_eq!(events.len(), 6);
        for (i, event) in events[..5].iter().enumerate() {
            match event {
                RankEvent::Progress { current, total } => {
                    assert_eq!(*current, i + 1);
                    assert_eq!(*total, 5);
                }
                other => panic!("expected progress event, got {other:?}"),
            }
        }
        let (_, top) = complete_event(&events);
        assert_eq!(top.len(), 3);
        // C2 never ranks.
        assert!(top.iter().all(|r| r.candidate.employee_id != "C2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ranking_sorts_descending_with_stable_ties() {
        let store = store_with(&["C1", "C2", "C3", "C4"]);
        let replies = [
            resume_reply(40),
            resume_reply(95),
            resume_reply(70),
            resume_reply(95),
        ];
        let gateway =
            ScriptedGateway::replying(&replies.iter().map(String::as_str).collect::<Vec<_>>());

        let events = collect(store, gateway, request(&["C1", "C2", "C3", "C4"])).await;
        let (_, top) = complete_event(&events);

        assert_eq!(top[0].rank, 1);
        assert_eq!(top[0].candidate.employee_id, "C2"); // first-seen 95 wins the tie
        assert_eq!(top[1].candidate.employee_id, "C4");
        assert_eq!(top[2].candidate.employee_id, "C3");
        assert_eq!(top[2].evaluation.scores.overall, 70);
    }

    #[tokio::test(start_paused = true)]
    async fn test_review_blend_applies_70_30_weighting() {
        let monthly = vec![json!({"employee_id": "T1", "year_month": "2024-06", "summary": "好調"})];
        let store = Arc::new(
            RecordStore::new(vec![record("C1")]).with_reviews(monthly, vec![]),
        );
        let replies = [resume_reply(80), review_reply(60)];
        let gateway =
            ScriptedGateway::replying(&replies.iter().map(String::as_str).collect::<Vec<_>>());

        let events = collect(store, gateway, request(&["C1"])).await;
        let (_, top) = complete_event(&events);

        // round(0.7 * 80 + 0.3 * 60) = 74
        assert_eq!(top[0].evaluation.scores.overall, 74);
        assert!(top[0]
            .evaluation
            .strengths
            .contains(&"レビュー強み".to_string()));
        assert!(top[0].evaluation.explanation.contains("レビュー所見"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_review_call_keeps_resume_only_evaluation() {
        let monthly = vec![json!({"employee_id": "C1", "year_month": "2024-06"})];
        let store = Arc::new(
            RecordStore::new(vec![record("C1")]).with_reviews(monthly, vec![]),
        );
        let replies = [resume_reply(80), "garbled".to_string()];
        let gateway =
            ScriptedGateway::replying(&replies.iter().map(String::as_str).collect::<Vec<_>>());

        let events = collect(store, gateway, request(&["C1"])).await;
        let (_, top) = complete_event(&events);

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].evaluation.scores.overall, 80);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_reviews_means_single_call_per_candidate() {
        let store = store_with(&["C1"]);
        let replies = [resume_reply(55), review_reply(99)];
        let gateway =
            ScriptedGateway::replying(&replies.iter().map(String::as_str).collect::<Vec<_>>());

        let events = collect(store, gateway, request(&["C1"])).await;
        let (_, top) = complete_event(&events);
        assert_eq!(top[0].evaluation.scores.overall, 55);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_candidate_is_skipped_with_progress() {
        let store = store_with(&["C1"]);
        let reply = resume_reply(50);
        let gateway = ScriptedGateway::replying(&[reply.as_str()]);

        let events = collect(store, gateway, request(&["GHOST", "C1"])).await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], RankEvent::Progress { current: 1, total: 2 }));
        let (thinking, top) = complete_event(&events);
        assert_eq!(top.len(), 1);
        assert!(thinking.contains('1'));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_candidate_list_completes_immediately() {
        let store = store_with(&["C1"]);
        let gateway = ScriptedGateway::replying(&[]);

        let events = collect(store, gateway, request(&[])).await;

        assert_eq!(events.len(), 1);
        let (_, top) = complete_event(&events);
        assert!(top.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_is_capped_at_thirty() {
        let ids: Vec<String> = (0..40).map(|i| format!("C{i}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let store = store_with(&id_refs);
        let replies: Vec<String> = (0..30).map(|_| resume_reply(50)).collect();
        let gateway =
            ScriptedGateway::replying(&replies.iter().map(String::as_str).collect::<Vec<_>>());

        let events = collect(store, gateway, request(&id_refs)).await;

        // 30 progress events + 1 complete; candidates past the cap are ignored.
        assert_eq!(events.len(), 31);
        assert!(matches!(
            events[29],
            RankEvent::Progress { current: 30, total: 30 }
        ));
    }

    fn uniform_scores(value: u8) -> crate::search::models::EvaluationScores {
        crate::search::models::EvaluationScores {
            technical_skills: value,
            domain_expertise: value,
            experience_level: value,
            role_alignment: value,
            soft_skills: value,
            overall: value,
        }
    }

    #[test]
    fn test_assemble_enforces_caps() {
        let evaluation = assemble(CandidateEvaluation {
            scores: uniform_scores(120),
            strengths: (0..5).map(|i| format!("s{i}")).collect(),
            gaps: (0..4).map(|i| format!("g{i}")).collect(),
            explanation: String::new(),
        });
        assert_eq!(evaluation.strengths.len(), 3);
        assert_eq!(evaluation.gaps.len(), 2);
        assert_eq!(evaluation.scores.overall, 100);
    }

    #[test]
    fn test_blend_concatenates_explanations() {
        let mut evaluation = CandidateEvaluation {
            scores: uniform_scores(90),
            strengths: vec!["a".into(), "b".into(), "c".into()],
            gaps: vec!["x".into(), "y".into()],
            explanation: "レジュメ所見。".to_string(),
        };
        blend_review(
            &mut evaluation,
            serde_json::from_str(&review_reply(50)).unwrap(),
        );

        // round(0.7 * 90 + 0.3 * 50) = 78
        assert_eq!(evaluation.scores.overall, 78);
        // Already at the caps: review items cannot push past them.
        assert_eq!(evaluation.strengths.len(), 3);
        assert_eq!(evaluation.gaps.len(), 2);
        assert_eq!(evaluation.explanation, "レジュメ所見。 レビュー所見。");
    }
}
