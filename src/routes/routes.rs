//! Defines the HTTP surface of the product API.
//!
//! ## Structure
//! - `GET  /`               — liveness message
//! - `POST /products`       — create product (document + image + access log)
//! - `GET  /products/{id}`  — fetch product by integer id
//! - `GET  /logs`           — 50 most recent access-log rows

use crate::{
    handlers::{
        health_handlers::index,
        log_handlers::list_logs,
        product_handlers::{create_product, get_product},
    },
    services::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router carrying shared `AppState` to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/products", post(create_product))
        .route("/products/{id}", get(get_product))
        .route("/logs", get(list_logs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend,
        clients::{
            document_store::{DocumentStore, SqliteDocumentStore, Table},
            relational::RelationalClient,
        },
        models::access_log::AccessAction,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use base64::{Engine as _, engine::general_purpose};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{Value, json};
    use std::path::Path;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BUCKET: &str = "test-bucket";

    struct TestApp {
        dir: TempDir,
        router: Router,
    }

    impl TestApp {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let state = backend::local(dir.path(), BUCKET).await.unwrap();
            Self {
                router: routes().with_state(state),
                dir,
            }
        }

        fn data_dir(&self) -> &Path {
            self.dir.path()
        }

        async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
                .await
                .unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }

        async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::get(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            let req = Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.send(req).await
        }

        fn relational(&self) -> RelationalClient {
            RelationalClient::sqlite(backend::local_db_path(self.data_dir()))
        }
    }

    fn product_body(name: &str) -> Value {
        json!({
            "name": name,
            "image": general_purpose::STANDARD.encode(b"\xff\xd8\xff\xe0"),
            "description": "a thing",
        })
    }

    #[tokio::test]
    async fn index_reports_alive() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"text": "I'm Alive...."}));
    }

    #[tokio::test]
    async fn create_product_stores_document_image_and_log() {
        let app = TestApp::new().await;
        let started = Utc::now();

        let (status, body) = app.post_json("/products", product_body("lamp")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"message": "Product created successfully"}));

        let (status, logs) = app.get("/logs").await;
        assert_eq!(status, StatusCode::OK);
        let logs = logs.as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["action"], "CREATE");

        let product_id = logs[0]["product_id"].as_str().unwrap().to_string();
        let logged_at: chrono::DateTime<Utc> =
            serde_json::from_value(logs[0]["timestamp"].clone()).unwrap();
        assert!(logged_at >= started);

        let pool = backend::open_local_pool(app.data_dir()).await.unwrap();
        let documents = SqliteDocumentStore::new(pool);
        let item = documents
            .get_item(Table::Products, &product_id)
            .await
            .unwrap()
            .unwrap();
        let key = format!("products/{}/lamp.jpg", product_id);
        assert_eq!(item["name"], "lamp");
        assert_eq!(item["description"], "a thing");
        assert_eq!(
            item["image_url"],
            format!("https://{}.s3.amazonaws.com/{}", BUCKET, key)
        );

        let image = std::fs::read(app.data_dir().join("objects").join(BUCKET).join(&key)).unwrap();
        assert_eq!(image, b"\xff\xd8\xff\xe0");
    }

    #[tokio::test]
    async fn each_create_generates_a_new_id() {
        let app = TestApp::new().await;

        for _ in 0..3 {
            let (status, _) = app.post_json("/products", product_body("lamp")).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, logs) = app.get("/logs").await;
        let mut ids: Vec<&str> = logs
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["product_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids.len(), 3);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn create_with_missing_field_is_rejected_without_side_effects() {
        let app = TestApp::new().await;

        for missing in ["name", "image", "description"] {
            let mut body = product_body("lamp");
            body.as_object_mut().unwrap().remove(missing);

            let (status, body) = app.post_json("/products", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "without {missing}");
            assert_eq!(body, json!({"error": "Missing fields"}));
        }

        let (status, _) = app.get("/logs").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/products/12345").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Product not found"}));

        let (status, _) = app.get("/products/lamp").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_accepts_names_with_consecutive_dots() {
        let app = TestApp::new().await;

        for name in ["Wait...", "v1..2 lamp", "lamp"] {
            let (status, body) = app.post_json("/products", product_body(name)).await;
            assert_eq!(status, StatusCode::CREATED, "name {name:?}");
            assert_eq!(body, json!({"message": "Product created successfully"}));
        }

        let (_, logs) = app.get("/logs").await;
        assert_eq!(logs.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn signed_ids_do_not_match_the_product_route() {
        let app = TestApp::new().await;

        for uri in ["/products/-3", "/products/+3"] {
            let (status, body) = app.get(uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body, json!({"error": "Not Found"}));
        }
    }

    #[tokio::test]
    async fn created_products_are_not_reachable_by_integer_id() {
        let app = TestApp::new().await;
        app.post_json("/products", product_body("lamp")).await;

        let (status, _) = app.get("/products/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn product_with_integer_key_is_returned_and_audited() {
        let app = TestApp::new().await;
        let pool = backend::open_local_pool(app.data_dir()).await.unwrap();
        let documents = SqliteDocumentStore::new(pool);
        let item = json!({"id": "7", "name": "legacy", "image_url": "", "description": "d"});
        documents
            .put_item(Table::Products, item.as_object().cloned().unwrap())
            .await
            .unwrap();

        let (status, body) = app.get("/products/7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, item);

        let (_, logs) = app.get("/logs").await;
        assert_eq!(logs[0]["product_id"], "7");
        assert_eq!(logs[0]["action"], "CREATE");
    }

    #[tokio::test]
    async fn logs_are_empty_until_something_happens() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/logs").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "No logs found"}));
    }

    #[tokio::test]
    async fn logs_return_newest_fifty() {
        let app = TestApp::new().await;
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let mut conn = app.relational().connect().await.unwrap();
        // Inserted out of order so the listing has to sort.
        for i in (0..60).rev() {
            conn.insert_access_log(
                &format!("p-{i}"),
                AccessAction::Create,
                base + Duration::minutes(i),
            )
            .await
            .unwrap();
        }
        conn.finish(Ok(())).await.unwrap();

        let (status, logs) = app.get("/logs").await;
        assert_eq!(status, StatusCode::OK);
        let logs = logs.as_array().unwrap();
        assert_eq!(logs.len(), 50);
        assert_eq!(logs[0]["product_id"], "p-59");
        assert_eq!(logs[49]["product_id"], "p-10");

        let stamps: Vec<chrono::DateTime<Utc>> = logs
            .iter()
            .map(|l| serde_json::from_value(l["timestamp"].clone()).unwrap())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] > w[1]));
    }

    #[tokio::test]
    async fn non_json_body_is_rejected_by_the_extractor() {
        let app = TestApp::new().await;

        let req = Request::post("/products")
            .header("content-type", "application/json")
            .body(Body::from("name=lamp"))
            .unwrap();
        let (status, _) = app.send(req).await;
        assert!(status.is_client_error());
    }
}
