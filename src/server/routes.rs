use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::model::{Job, NewJob};
use crate::query::{self, AnalyticsEngine, Degraded, FallbackReason, JobFilter, JobQueries, Summary, DEFAULT_LIST_LIMIT};
use crate::server::AppState;
use crate::server::error::ApiError;
use crate::Error;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobCount {
    pub total_jobs: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

fn log_fallback<T>(endpoint: &str, result: &Degraded<T>) {
    match result.fallback_reason() {
        None => {}
        Some(FallbackReason::EmptyStore) => {
            tracing::warn!("{}: no jobs found in database, serving defaults", endpoint);
        }
        Some(reason @ FallbackReason::StoreUnavailable(_)) => {
            tracing::error!("{}: {}, serving defaults", endpoint, reason);
        }
    }
}

/// GET /analytics/summary
///
/// Never fails: an empty or unreachable store yields the all-zero summary.
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<Summary> {
    let result = state
        .store
        .run(|conn| AnalyticsEngine::new(conn).summarize())
        .await;

    let summary = Degraded::or_unavailable(result);
    log_fallback("analytics", &summary);
    Json(summary.into_value())
}

/// GET /jobs?search=&limit=&skip=
///
/// Never fails: an unreachable store yields an empty list.
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Job>> {
    let filter = JobFilter {
        search: params.search,
        limit: params
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .min(state.config.max_list_limit),
        offset: params.skip.unwrap_or(0),
    };

    let result = state
        .store
        .run(move |conn| JobQueries::new(conn).list(&filter).map(Degraded::Fresh))
        .await;

    let jobs = Degraded::or_unavailable(result);
    log_fallback("jobs", &jobs);
    tracing::debug!("Fetched {} jobs", jobs.value().len());
    Json(jobs.into_value())
}

/// POST /jobs
///
/// Input is validated here, before any store work is scheduled.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    input.validate()?;

    let default_work_year = state.config.default_work_year;
    let job = state
        .store
        .run(move |conn| query::create_job(conn, &input, default_work_year))
        .await?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /jobs/count
pub async fn count_jobs(State(state): State<Arc<AppState>>) -> Result<Json<JobCount>, ApiError> {
    let total_jobs = state
        .store
        .run(|conn| JobQueries::new(conn).count())
        .await?;
    Ok(Json(JobCount { total_jobs }))
}

/// GET /jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Job>, ApiError> {
    let job = state
        .store
        .run(move |conn| JobQueries::new(conn).get(id))
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))?;
    Ok(Json(job))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.run(|conn| JobQueries::new(conn).count()).await {
        Ok(count) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                message: format!("API is running. {} jobs in database.", count),
            }),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "error".to_string(),
                    message: "Database connection failed".to_string(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobTrendsConfig;
    use crate::server::build_router;
    use crate::storage::SqliteStore;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> (Router, SqliteStore) {
        let store = SqliteStore::open_in_memory().unwrap();
        let app = build_router(AppState::new(store.clone(), JobTrendsConfig::default()));
        (app, store)
    }

    fn app_with(store: &SqliteStore, config: JobTrendsConfig) -> Router {
        build_router(AppState::new(store.clone(), config))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        send(
            app,
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    fn break_store(store: &SqliteStore) {
        let conn = store.session().unwrap();
        conn.execute("DROP TABLE job_skills", []).unwrap();
        conn.execute("DROP TABLE jobs", []).unwrap();
    }

    #[tokio::test]
    async fn test_summary_on_empty_store() {
        let (app, _store) = test_app();
        let (status, body) = get(&app, "/analytics/summary").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_jobs"], 0);
        assert_eq!(body["avg_salary"], 0);
        assert_eq!(body["top_skills"], json!([]));
        assert_eq!(body["salary_trend"], json!([]));
        assert_eq!(body["work_setting"], json!([]));
        assert_eq!(body["company_size"], json!([]));
    }

    #[tokio::test]
    async fn test_create_then_summarize_and_search() {
        let (app, _store) = test_app();

        let (status, created) = post_json(&app, "/jobs", json!({
            "title": "Data Engineer",
            "location": "Remote",
            "min_salary": 90000,
            "work_year": 2023,
            "company_name": "Acme",
            "skills": ["Python", "SQL"]
        }))
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["id"].as_i64().unwrap() > 0);
        assert_eq!(created["company_name"], "Acme");
        assert_eq!(created["skills"], json!(["Python", "SQL"]));

        post_json(&app, "/jobs", json!({
            "title": "Product Manager",
            "location": "London",
            "company_name": "Beta"
        }))
        .await;

        let (_, summary) = get(&app, "/analytics/summary").await;
        assert_eq!(summary["total_jobs"], 2);
        assert_eq!(summary["salary_trend"][0], json!({"year": 2023, "salary": 90000}));

        let (status, jobs) = get(&app, "/jobs?search=Remote").await;
        assert_eq!(status, StatusCode::OK);
        let jobs = jobs.as_array().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_work_year_defaults() {
        let (app, _store) = test_app();
        let (status, created) = post_json(&app, "/jobs", json!({
            "title": "Analyst",
            "company_name": "Acme"
        }))
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["work_year"], 2024);
    }

    #[tokio::test]
    async fn test_list_limit_and_skip() {
        let (app, _store) = test_app();
        for i in 0..4 {
            post_json(&app, "/jobs", json!({"title": format!("Job {}", i), "company_name": "Acme"})).await;
        }

        let (_, all) = get(&app, "/jobs").await;
        assert_eq!(all.as_array().unwrap().len(), 4);

        let (_, page) = get(&app, "/jobs?limit=2&skip=1").await;
        let page = page.as_array().unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0]["title"], "Job 1");

        let (status, _) = get(&app, "/jobs?limit=-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_body() {
        let (app, store) = test_app();

        let (status, body) = post_json(&app, "/jobs", json!({"title": "  ", "company_name": "Acme"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("title"));

        let (status, _) = post_json(&app, "/jobs", json!({"title": "Analyst"})).await;
        assert!(status.is_client_error());

        let (status, _) = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/jobs")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert!(status.is_client_error());

        let companies: i64 = store
            .session()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))
            .unwrap();
        assert_eq!(companies, 0);
    }

    #[tokio::test]
    async fn test_get_job_and_count() {
        let (app, _store) = test_app();
        let (_, created) = post_json(&app, "/jobs", json!({"title": "Analyst", "company_name": "Acme"})).await;

        let (status, fetched) = get(&app, &format!("/jobs/{}", created["id"])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, body) = get(&app, "/jobs/424242").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());

        let (status, count) = get(&app, "/jobs/count").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(count["total_jobs"], 1);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _store) = test_app();
        let (status, body) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["message"], "API is running. 0 jobs in database.");
    }

    #[tokio::test]
    async fn test_broken_store_degrades_reads() {
        let (app, store) = test_app();
        break_store(&store);

        let (status, summary) = get(&app, "/analytics/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["total_jobs"], 0);

        let (status, jobs) = get(&app, "/jobs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(jobs, json!([]));

        let (status, health) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(health["status"], "error");

        let (status, body) = post_json(&app, "/jobs", json!({"title": "Analyst", "company_name": "Acme"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("jobs"));
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin_by_default() {
        let (app, _store) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_restricted_to_configured_origins() {
        let store = SqliteStore::open_in_memory().unwrap();
        let config = JobTrendsConfig {
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
            ..JobTrendsConfig::default()
        };
        let app = app_with(&store, config);

        let allowed = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );

        let foreign = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(foreign.headers().get("access-control-allow-origin").is_none());

        let preflight = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/jobs")
                    .header("origin", "http://localhost:5173")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let methods = preflight
            .headers()
            .get("access-control-allow-methods")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("POST"));
        assert!(!methods.contains("DELETE"));
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("jobs.db"), &Default::default()).unwrap();
        let config = JobTrendsConfig {
            request_timeout_secs: 1,
            ..JobTrendsConfig::default()
        };
        let app = app_with(&store, config);

        // Hold the write lock so the create waits on the busy timeout
        let lock = store.session().unwrap();
        lock.execute_batch("BEGIN IMMEDIATE").unwrap();

        let (status, _) = post_json(&app, "/jobs", json!({"title": "Analyst", "company_name": "Acme"})).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);

        lock.execute_batch("ROLLBACK").unwrap();
    }
}
