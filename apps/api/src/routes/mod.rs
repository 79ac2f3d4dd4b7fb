pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::search::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(health::health_handler))
        // Roster lookup
        .route("/api/people/:query", get(handlers::handle_search_people))
        // Similar-employee funnel: analysis → filtering → evaluation
        .route(
            "/api/search/similar-employees",
            post(handlers::handle_analyze),
        )
        .route("/api/search/filter", post(handlers::handle_filter))
        .route(
            "/api/search/evaluate/stream",
            post(handlers::handle_evaluate_stream),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::llm_gateway::testing::ScriptedGateway;
    use crate::store::models::EmployeeRecord;
    use crate::store::RecordStore;

    fn state_with(employees: Vec<EmployeeRecord>, gateway: ScriptedGateway) -> AppState {
        AppState {
            store: Arc::new(RecordStore::new(employees)),
            llm: Arc::new(gateway),
        }
    }

    fn record(id: &str, name: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            employee_name: Some(name.to_string()),
            current_employee_flag: Some("●".to_string()),
            ..Default::default()
        }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = build_router(state_with(vec![], ScriptedGateway::replying(&[])));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["service"], "talent-api");
    }

    #[tokio::test]
    async fn test_analyze_rejects_target_without_id() {
        let app = build_router(state_with(vec![], ScriptedGateway::replying(&[])));
        let response = app
            .oneshot(post_json(
                "/api/search/similar-employees",
                json!({"target_employee": {"employee_name": "X"}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = read_json(response).await;
        assert_eq!(payload["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_filter_on_empty_store_is_404() {
        let app = build_router(state_with(vec![], ScriptedGateway::replying(&[])));
        let response = app
            .oneshot(post_json(
                "/api/search/filter",
                json!({
                    "search_id": "s-1",
                    "hard_filters": {},
                    "target_employee_id": "E1"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let payload = read_json(response).await;
        assert_eq!(payload["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_filter_returns_stats_and_candidates() {
        let employees = vec![
            record("E1", "ターゲット"),
            record("E2", "候補A"),
            record("E3", "候補B"),
        ];
        let app = build_router(state_with(employees, ScriptedGateway::replying(&[])));
        let response = app
            .oneshot(post_json(
                "/api/search/filter",
                json!({
                    "search_id": "s-1",
                    "hard_filters": {},
                    "target_employee_id": "E1",
                    "language": "en"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["stage"], "filtering");
        assert_eq!(payload["stats"]["total"], 3);
        assert_eq!(payload["stats"]["kept"], 2);
        assert_eq!(
            payload["candidate_ids"],
            json!(["E2", "E3"])
        );
        assert!(payload["thinking_text"]
            .as_str()
            .unwrap()
            .starts_with("Searched the database"));
    }

    #[tokio::test]
    async fn test_people_search_route_orders_results() {
        let mut by_name = record("2002", "データ 次郎");
        by_name.employee_name = Some("データ 次郎".to_string());
        let exact = record("1001", "山田");
        let app = build_router(state_with(vec![by_name, exact], ScriptedGateway::replying(&[])));

        let response = app
            .oneshot(Request::get("/api/people/1001").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload[0]["person"]["employee_id"], "1001");
        assert_eq!(payload[0]["score"], 1.0);
    }

    #[tokio::test]
    async fn test_evaluate_stream_has_event_stream_content_type() {
        let app = build_router(state_with(
            vec![record("E1", "A")],
            ScriptedGateway::replying(&[]),
        ));
        let response = app
            .oneshot(post_json(
                "/api/search/evaluate/stream",
                json!({
                    "search_id": "s-1",
                    "target_employee": {"employee_id": "E9"},
                    "candidate_ids": []
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("text/event-stream"));
    }
}
