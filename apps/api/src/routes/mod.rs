pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::screening::handlers as screening;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview API
        .route("/api/v1/interviews", post(interview::handle_start_interview))
        .route("/api/v1/interviews/:id", get(interview::handle_get_interview))
        .route(
            "/api/v1/interviews/:id/turns",
            post(interview::handle_take_turn),
        )
        .route(
            "/api/v1/interviews/:id/report",
            get(interview::handle_get_report),
        )
        // Screening API
        .route("/api/v1/screenings", post(screening::handle_screening))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::interview::controller::TurnController;
    use crate::interview::prompts::DEFAULT_GREETING;
    use crate::interview::stages::{InterviewSettings, Pipeline};
    use crate::interview::store::InMemorySessionStore;
    use crate::llm_client::testing::ScriptedGenerator;

    fn test_config(max_turns: u32) -> Config {
        Config {
            anthropic_api_key: "test-key".to_string(),
            interview_max_turns: max_turns,
            llm_timeout: Duration::from_secs(30),
            redis_url: None,
            session_ttl_secs: 60,
            interview_greeting: DEFAULT_GREETING.to_string(),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }

    fn app(replies: &[&str], max_turns: u32) -> Router {
        let config = test_config(max_turns);
        let generator = Arc::new(ScriptedGenerator::new(replies.iter().copied()));
        let pipeline = Pipeline::standard(
            generator.clone(),
            InterviewSettings {
                max_turns: config.interview_max_turns,
                generation_timeout: config.llm_timeout,
            },
        );
        let controller = TurnController::new(
            pipeline,
            Arc::new(InMemorySessionStore::new()),
            config.interview_greeting.clone(),
        );
        build_router(AppState {
            controller: Arc::new(controller),
            generator,
            config,
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(&[], 5), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_interview_runs_to_report_over_http() {
        let app = app(
            &[
                "What is your favourite Rust feature?",
                "```json\n{\"candidate_name\": \"Ana\"}\n```",
                r#"{"category_scores": {"technical": 7, "communication": 8, "soft_skills": 9}, "final_verdict": "Strong Hire"}"#,
                r#"{"short_summary": "Great fit."}"#,
            ],
            5,
        );

        let (status, started) = send(
            &app,
            "POST",
            "/api/v1/interviews",
            Some(json!({"resume_text": "Rust engineer"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(started["control"], "interviewing");
        assert_eq!(started["message"], DEFAULT_GREETING);
        let id = started["session_id"].as_str().unwrap().to_string();

        let turns = format!("/api/v1/interviews/{id}/turns");
        let (_, first) = send(&app, "POST", &turns, Some(json!({"text": "Ready"}))).await;
        assert_eq!(first["message"], "What is your favourite Rust feature?");
        assert_eq!(first["turn_count"], 1);
        assert_eq!(first["status"], "active");

        let report_uri = format!("/api/v1/interviews/{id}/report");
        let (_, pending) = send(&app, "GET", &report_uri, None).await;
        assert_eq!(pending, json!({"status": "in_progress", "control": "interviewing"}));

        let (_, closed) = send(&app, "POST", &turns, Some(json!({"text": "Traits"}))).await;
        assert_eq!(closed["control"], "evaluating");
        send(&app, "POST", &turns, Some(json!({}))).await;
        let (_, done) = send(&app, "POST", &turns, Some(json!({}))).await;
        assert_eq!(done["control"], "done");
        assert_eq!(done["status"], "completed");

        let (status, report) = send(&app, "GET", &report_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["status"], "completed");
        assert_eq!(report["summary"]["short_summary"], "Great fit.");
        assert_eq!(report["summary"]["confidence_score"], 9.0);
        assert_eq!(report["summary"]["verdict"], "Strong Hire");

        let (status, err) = send(&app, "POST", &turns, Some(json!({"text": "Hello?"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["error"]["code"], "SESSION_COMPLETED");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = app(&[], 5);
        let uri = format!("/api/v1/interviews/{}/turns", uuid::Uuid::new_v4());
        let (status, body) = send(&app, "POST", &uri, Some(json!({"text": "hi"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_screening_endpoint() {
        let app = app(
            &[r#"{"match_percentage": 91, "status": "Not Qualified", "missing_keywords": []}"#],
            5,
        );
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/screenings",
            Some(json!({"resume_text": "Rust, Tokio", "job_description": "Rust backend"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["match_percentage"], 91);
        assert_eq!(body["status"], "Qualified");
    }

    #[tokio::test]
    async fn test_screening_rejects_empty_input() {
        let (status, body) = send(
            &app(&[], 5),
            "POST",
            "/api/v1/screenings",
            Some(json!({"resume_text": " ", "job_description": "Rust backend"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
