pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{admin, alerts, applications, favorites, listings, notifications, profiles, search};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Public listings and search
        .route("/api/jobs", get(listings::handlers::handle_index))
        .route("/api/jobs/:id", get(listings::handlers::handle_show))
        .route("/api/jobs/:id/apply", post(applications::handlers::handle_apply))
        .route("/api/search/jobs", get(search::handlers::handle_jobs))
        .route("/api/search/skills", get(search::handlers::handle_skills))
        .route("/api/search/companies", get(search::handlers::handle_companies))
        .route("/api/search/suggestions", get(search::handlers::handle_suggestions))
        // Candidate
        .route(
            "/api/candidate/profile",
            get(profiles::handlers::handle_show)
                .post(profiles::handlers::handle_store)
                .put(profiles::handlers::handle_update),
        )
        .route("/api/candidate/profile/create", get(profiles::handlers::handle_create))
        .route(
            "/api/candidate/applications",
            get(applications::handlers::handle_candidate_index),
        )
        .route("/api/candidate/favorites", get(favorites::handlers::handle_index))
        .route(
            "/api/candidate/favorites/:job",
            post(favorites::handlers::handle_store).delete(favorites::handlers::handle_destroy),
        )
        .route(
            "/api/candidate/favorites/:job/toggle",
            post(favorites::handlers::handle_toggle),
        )
        .route(
            "/api/candidate/job-alerts",
            get(alerts::handlers::handle_index).post(alerts::handlers::handle_store),
        )
        .route(
            "/api/candidate/job-alerts/:id",
            get(alerts::handlers::handle_show)
                .put(alerts::handlers::handle_update)
                .delete(alerts::handlers::handle_destroy),
        )
        .route(
            "/api/candidate/job-alerts/:id/toggle",
            post(alerts::handlers::handle_toggle),
        )
        .route("/api/candidate/job-alerts/:id/test", post(alerts::handlers::handle_test))
        .route(
            "/api/candidate/notifications",
            get(notifications::handlers::handle_index),
        )
        .route(
            "/api/candidate/notifications/unread-count",
            get(notifications::handlers::handle_unread_count),
        )
        .route(
            "/api/candidate/notifications/mark-all-read",
            post(notifications::handlers::handle_mark_all_read),
        )
        .route(
            "/api/candidate/notifications/:id",
            axum::routing::delete(notifications::handlers::handle_delete),
        )
        .route(
            "/api/candidate/notifications/:id/read",
            post(notifications::handlers::handle_mark_read),
        )
        // Recruiter
        .route(
            "/api/recruiter/jobs",
            get(listings::handlers::handle_recruiter_index).post(listings::handlers::handle_create),
        )
        .route(
            "/api/recruiter/applications",
            get(applications::handlers::handle_recruiter_index),
        )
        .route(
            "/api/recruiter/applications/:id",
            get(applications::handlers::handle_recruiter_show),
        )
        .route(
            "/api/recruiter/applications/:id/status",
            post(applications::handlers::handle_update_status),
        )
        // Admin
        .route("/api/admin/dashboard", get(admin::handlers::handle_dashboard))
        .route("/api/admin/jobs/pending", get(admin::handlers::handle_pending))
        .route("/api/admin/jobs/:id/review", get(admin::handlers::handle_review))
        .route("/api/admin/jobs/:id/approve", post(admin::handlers::handle_approve))
        .route("/api/admin/jobs/:id/reject", post(admin::handlers::handle_reject))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::matching::scoring::HeuristicScorer;
    use crate::notifications::testing::RecordingNotifier;

    /// The pool never connects; only paths that fail before touching the
    /// database are exercised here.
    fn app() -> Router {
        let config = Config::for_tests();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        build_router(AppState {
            db,
            config,
            scorer: Arc::new(HeuristicScorer::new()),
            notifier: Arc::new(RecordingNotifier::default()),
        })
    }

    async fn get_status(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_status("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "jobboard-api");
    }

    #[tokio::test]
    async fn test_candidate_routes_require_user_header() {
        for uri in [
            "/api/candidate/profile",
            "/api/candidate/job-alerts",
            "/api/candidate/notifications/unread-count",
            "/api/admin/dashboard",
        ] {
            let (status, body) = get_status(uri).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn test_search_rejects_unknown_sort_order() {
        let (status, body) = get_status("/api/search/jobs?sort_order=sideways").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_search_with_unknown_job_type_is_empty() {
        let (status, body) = get_status("/api/search/jobs?job_type=freelance&per_page=500").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert_eq!(body["per_page"], 100);
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_malformed_query_is_bad_request() {
        let (status, _) = get_status("/api/search/jobs?salary_min=lots").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
