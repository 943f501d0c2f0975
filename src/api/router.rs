//! API router.
//!
//! Returns a composable `Router` nested under `/api/`.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the full application router.
pub fn app_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/summaries", get(endpoints::summaries::list))
        .route("/documents", post(endpoints::documents::create))
        .route("/documents/:id/verify", post(endpoints::documents::verify))
        .route(
            "/documents/:id/reprocess",
            post(endpoints::documents::reprocess),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::db::repository;
    use crate::db::sqlite::open_database;
    use crate::jobs::queue::ProcessingTrigger;
    use crate::models::enums::Language;
    use crate::models::{Document, Region, Summary};

    /// Trigger double recording every enqueued document id.
    struct RecordingTrigger {
        ids: Mutex<Vec<Uuid>>,
    }

    impl RecordingTrigger {
        fn new() -> Self {
            Self {
                ids: Mutex::new(Vec::new()),
            }
        }

        fn recorded(&self) -> Vec<Uuid> {
            self.ids.lock().unwrap().clone()
        }
    }

    impl ProcessingTrigger for RecordingTrigger {
        fn enqueue_document(&self, document_id: Uuid) {
            self.ids.lock().unwrap().push(document_id);
        }
    }

    struct TestApp {
        router: Router,
        trigger: Arc<RecordingTrigger>,
        db: tempfile::NamedTempFile,
    }

    fn test_app() -> TestApp {
        let db = tempfile::NamedTempFile::new().unwrap();
        open_database(db.path()).unwrap();
        let trigger = Arc::new(RecordingTrigger::new());
        let ctx = ApiContext::new(db.path().to_path_buf(), trigger.clone());
        TestApp {
            router: app_router(ctx),
            trigger,
            db,
        }
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn post_json(
        router: Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = test_app();
        let (status, json) = get_json(app.router, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn summaries_unknown_region_is_404() {
        let app = test_app();
        let (status, json) = get_json(app.router, "/api/summaries?region=ZZ&language=en").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn summaries_unknown_language_is_400() {
        let app = test_app();
        let conn = open_database(app.db.path()).unwrap();
        repository::insert_region(&conn, &Region::new("Uganda", "UG")).unwrap();

        let (status, json) = get_json(app.router, "/api/summaries?region=UG&language=xx").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn summaries_returns_one_entry_per_document() {
        let app = test_app();
        let conn = open_database(app.db.path()).unwrap();

        let region = Region::new("Uganda", "UG");
        repository::insert_region(&conn, &region).unwrap();

        let doc = Document::new(
            "Uganda Budget 2025",
            Some("https://example.com/budget.pdf".into()),
            None,
            region.id,
        );
        repository::insert_document(&conn, &doc).unwrap();

        let mut summary = Summary::new(
            doc.id,
            Language::En,
            "The budget funds maternal health programs.".into(),
            Some("relevant excerpt".into()),
        );
        summary.explanation = Some("This budget helps mothers get care.".into());
        repository::insert_summary(&conn, &summary).unwrap();

        // A second document without a summary must not appear
        let bare = Document::new(
            "Draft Estimates",
            Some("https://example.com/draft.pdf".into()),
            None,
            region.id,
        );
        repository::insert_document(&conn, &bare).unwrap();

        let (status, json) = get_json(app.router, "/api/summaries?region=UG&language=en").await;
        assert_eq!(status, StatusCode::OK);

        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry["document_title"], "Uganda Budget 2025");
        assert_eq!(entry["text"], "The budget funds maternal health programs.");
        assert_eq!(entry["original_text"], "relevant excerpt");
        assert_eq!(entry["explanation"], "This budget helps mothers get care.");
        assert_eq!(entry["language"], "en");
        assert_eq!(entry["region_name"], "Uganda");
        assert_eq!(entry["factCheck"]["is_verified"], false);
        assert_eq!(
            entry["factCheck"]["source_url"],
            "https://example.com/budget.pdf"
        );
    }

    #[tokio::test]
    async fn create_document_enqueues_processing() {
        let app = test_app();
        let (status, json) = post_json(
            app.router,
            "/api/documents",
            serde_json::json!({
                "title": "Uganda Budget 2025",
                "region_code": "UG",
                "region_name": "Uganda",
                "pdf_url": "https://example.com/budget.pdf"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["processing_status"], "unprocessed");

        let id = Uuid::parse_str(json["id"].as_str().unwrap()).unwrap();
        assert_eq!(app.trigger.recorded(), vec![id]);
    }

    #[tokio::test]
    async fn create_document_with_both_sources_is_400() {
        let app = test_app();
        let (status, _) = post_json(
            app.router,
            "/api/documents",
            serde_json::json!({
                "title": "Budget",
                "region_code": "UG",
                "pdf_url": "https://example.com/budget.pdf",
                "local_file": "/data/budget.pdf"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(app.trigger.recorded().is_empty());
    }

    #[tokio::test]
    async fn create_document_with_no_source_is_400() {
        let app = test_app();
        let (status, _) = post_json(
            app.router,
            "/api/documents",
            serde_json::json!({"title": "Budget", "region_code": "UG"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_endpoint_syncs_fact_checks() {
        let app = test_app();
        let conn = open_database(app.db.path()).unwrap();

        let region = Region::new("Uganda", "UG");
        repository::insert_region(&conn, &region).unwrap();
        let doc = Document::new("Budget", Some("https://x/budget.pdf".into()), None, region.id);
        repository::insert_document(&conn, &doc).unwrap();

        for lang in Language::ALL {
            let summary = Summary::new(doc.id, lang, "Summary text".into(), None);
            repository::insert_summary(&conn, &summary).unwrap();
            repository::get_or_create_fact_check(&conn, &summary.id, "https://stale", false)
                .unwrap();
        }

        let (status, json) = post_json(
            app.router,
            &format!("/api/documents/{}/verify", doc.id),
            serde_json::json!({
                "verified": true,
                "verification_url": "https://audit.example.com/budget"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["verified"], true);
        assert_eq!(json["fact_checks_synced"], 2);

        let verified_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM fact_checks
                 WHERE is_verified = 1 AND source_url = 'https://audit.example.com/budget'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(verified_count, 2);
    }

    #[tokio::test]
    async fn verify_missing_document_is_404() {
        let app = test_app();
        let (status, _) = post_json(
            app.router,
            &format!("/api/documents/{}/verify", Uuid::new_v4()),
            serde_json::json!({"verified": true}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reprocess_resets_status_and_enqueues() {
        let app = test_app();
        let conn = open_database(app.db.path()).unwrap();

        let region = Region::new("Uganda", "UG");
        repository::insert_region(&conn, &region).unwrap();
        let doc = Document::new("Budget", Some("https://x/budget.pdf".into()), None, region.id);
        repository::insert_document(&conn, &doc).unwrap();
        repository::update_processing_status(
            &conn,
            &doc.id,
            crate::models::enums::ProcessingStatus::Processed,
        )
        .unwrap();

        let (status, json) = post_json(
            app.router,
            &format!("/api/documents/{}/reprocess", doc.id),
            serde_json::json!({}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["processing_status"], "unprocessed");
        assert_eq!(app.trigger.recorded(), vec![doc.id]);

        let reloaded = repository::get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(
            reloaded.processing_status,
            crate::models::enums::ProcessingStatus::Unprocessed
        );
    }

    #[tokio::test]
    async fn invalid_document_id_is_400() {
        let app = test_app();
        let (status, _) = post_json(
            app.router,
            "/api/documents/not-a-uuid/reprocess",
            serde_json::json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
