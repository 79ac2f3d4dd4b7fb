//! Route handlers for the three funnel stages and the roster lookup.
//!
//! Each stage is a separate request; the caller threads `search_id` and the
//! intermediate payloads forward, so the handlers hold no session state.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::Utc;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::errors::AppError;
use crate::search::analyzer::analyze_target;
use crate::search::filter::filter_candidates;
use crate::search::models::{
    AnalyzeRequest, AnalyzeResponse, EvaluateRequest, FilterRequest, FilterResponse, Language,
    PeopleSearchItem, PersonSummary,
};
use crate::search::ranker::rank_candidates;
use crate::state::AppState;

/// POST /api/search/similar-employees
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let response = analyze_target(state.llm.as_ref(), &req.target_employee, req.language).await?;
    Ok(Json(response))
}

/// POST /api/search/filter
pub async fn handle_filter(
    State(state): State<AppState>,
    Json(req): Json<FilterRequest>,
) -> Result<Json<FilterResponse>, AppError> {
    debug!("Filtering stage for search {}", req.search_id);
    let outcome = filter_candidates(
        &state.store,
        &req.hard_filters,
        &req.target_employee_id,
        req.user_filters.as_ref(),
        Utc::now().date_naive(),
    )?;

    let stats = outcome.stats;
    let thinking_text = match req.language {
        Language::En => format!(
            "Searched the database. Found {} candidates from {} employees ({:.1}% eliminated).",
            stats.kept, stats.total, stats.elimination_rate
        ),
        Language::Ja => format!(
            "データベースを検索しました。{}人の従業員から{}人の候補者を見つけました（{:.1}%を除外）。",
            stats.total, stats.kept, stats.elimination_rate
        ),
    };

    Ok(Json(FilterResponse {
        stage: "filtering".to_string(),
        thinking_text,
        stats,
        candidate_ids: outcome.candidate_ids,
        sql_query: outcome.sql_query,
    }))
}

/// POST /api/search/evaluate/stream
///
/// Streams one progress event per candidate and a final complete event.
/// Per-candidate failures never abort the stream; a disconnected caller
/// simply stops reading.
pub async fn handle_evaluate_stream(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(
        "Evaluation stage for search {} ({} candidates)",
        req.search_id,
        req.candidate_ids.len()
    );
    let events = rank_candidates(state.store.clone(), state.llm.clone(), req).map(|event| {
        let event = Event::default().json_data(&event).unwrap_or_else(|err| {
            tracing::error!("Failed to encode rank event: {err}");
            Event::default().data("{}")
        });
        Ok::<Event, Infallible>(event)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// GET /api/people/:query
pub async fn handle_search_people(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Json<Vec<PeopleSearchItem>> {
    let results = state
        .store
        .search_people(&query)
        .into_iter()
        .map(|(score, record)| PeopleSearchItem {
            person: PersonSummary::from_record(record),
            score,
        })
        .collect();
    Json(results)
}
