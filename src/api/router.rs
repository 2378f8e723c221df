//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints::{audit_logs, init, patients};
use crate::api::types::ApiContext;

/// Build the API router with all routes under `/api/`.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/patients", get(patients::list).post(patients::create))
        .route(
            "/patients/:id",
            get(patients::detail)
                .patch(patients::update)
                .delete(patients::remove),
        )
        .route("/audit-logs", get(audit_logs::list))
        .route("/init", post(init::run))
        .with_state(ctx);

    Router::new().nest("/api", routes).layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::db::sqlite::open_memory_database;

    fn test_router() -> Router {
        let conn = open_memory_database().unwrap();
        api_router(ApiContext::new(conn))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn draft_body(first: &str, last: &str) -> serde_json::Value {
        serde_json::json!({
            "firstName": first,
            "lastName": last,
            "dateOfBirth": "1985-06-01",
            "status": "Inquiry",
            "email": format!("{}@example.com", first.to_lowercase()),
            "address": {
                "street": "12 Main St",
                "city": "Springfield",
                "state": "IL",
                "zipCode": "62701"
            }
        })
    }

    async fn create_patient(app: &Router, first: &str, last: &str) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/patients", draft_body(first, last)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await
    }

    #[tokio::test]
    async fn create_returns_201_with_server_assigned_fields() {
        let app = test_router();
        let json = create_patient(&app, "John", "Smith").await;

        assert_eq!(json["firstName"], "John");
        assert_eq!(json["status"], "Inquiry");
        assert_eq!(json["address"]["country"], "USA");
        assert!(!json["id"].as_str().unwrap().is_empty());
        assert_eq!(json["createdAt"], json["updatedAt"]);
    }

    #[tokio::test]
    async fn create_validation_failure_returns_400_with_details() {
        let app = test_router();
        let mut body = draft_body("John", "Smith");
        body["firstName"] = serde_json::json!("");
        body["dateOfBirth"] = serde_json::json!("06/01/1985");

        let response = app
            .oneshot(json_request("POST", "/api/patients", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = json["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"firstName"));
        assert!(fields.contains(&"dateOfBirth"));
    }

    #[tokio::test]
    async fn create_with_missing_fields_returns_400_json_error() {
        let app = test_router();
        let response = app
            .oneshot(json_request("POST", "/api/patients", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        assert_eq!(json["code"], "BAD_REQUEST");
        assert!(json["error"].as_str().unwrap().contains("firstName"));
    }

    #[tokio::test]
    async fn create_with_invalid_json_returns_400_json_error() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/patients")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(response).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn patch_with_empty_body_returns_400() {
        let app = test_router();
        let created = create_patient(&app, "John", "Smith").await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/api/patients/{id}"),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        assert_eq!(json["code"], "BAD_REQUEST");
        assert_eq!(json["error"], "No fields to update");
    }

    #[tokio::test]
    async fn get_round_trips_created_patient() {
        let app = test_router();
        let created = create_patient(&app, "John", "Smith").await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .oneshot(get_request(&format!("/api/patients/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await, created);
    }

    #[tokio::test]
    async fn get_unknown_id_returns_404() {
        let app = test_router();
        let response = app
            .oneshot(get_request(&format!("/api/patients/{}", uuid::Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = response_json(response).await;
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_uuid_returns_400() {
        let app = test_router();
        let response = app
            .oneshot(get_request("/api/patients/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(response).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn patch_updates_and_audits() {
        let app = test_router();
        let created = create_patient(&app, "John", "Smith").await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/patients/{id}"),
                serde_json::json!({"status": "Active", "phone": "555-0100"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = response_json(response).await;
        assert_eq!(updated["status"], "Active");
        assert_eq!(updated["phone"], "555-0100");
        assert_eq!(updated["firstName"], "John", "untouched field");

        let response = app
            .oneshot(get_request(&format!("/api/audit-logs?patientId={id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let entries = response_json(response).await;
        let entries = entries.as_array().unwrap();
        // CREATE + status + phone
        assert_eq!(entries.len(), 3);
        let status_entry = entries
            .iter()
            .find(|e| e["fieldName"] == "status")
            .unwrap();
        assert_eq!(status_entry["action"], "STATUS_CHANGE");
        assert_eq!(status_entry["oldValue"], "Inquiry");
        assert_eq!(status_entry["newValue"], "Active");
        assert_eq!(status_entry["performedBy"], "System");
    }

    #[tokio::test]
    async fn patch_unknown_status_returns_400() {
        let app = test_router();
        let created = create_patient(&app, "John", "Smith").await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/api/patients/{id}"),
                serde_json::json!({"status": "Archived"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_json(response).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn delete_succeeds_then_get_404_and_delete_entry_survives() {
        let app = test_router();
        let created = create_patient(&app, "John", "Smith").await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/patients/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await["success"], true);

        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/patients/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(get_request(&format!("/api/audit-logs?patientId={id}")))
            .await
            .unwrap();
        let entries = response_json(response).await;
        let entries = entries.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["action"], "DELETE");
    }

    #[tokio::test]
    async fn delete_unknown_id_returns_404() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/patients/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_envelope_and_filters() {
        let app = test_router();
        for (first, last) in [("John", "Smith"), ("Jane", "Jones"), ("Ann", "Adams")] {
            create_patient(&app, first, last).await;
        }

        let response = app
            .clone()
            .oneshot(get_request("/api/patients?page=1&pageSize=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["patients"].as_array().unwrap().len(), 2);
        assert_eq!(json["pagination"]["page"], 1);
        assert_eq!(json["pagination"]["pageSize"], 2);
        assert_eq!(json["pagination"]["totalCount"], 3);

        let response = app
            .clone()
            .oneshot(get_request("/api/patients?search=smith"))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["patients"].as_array().unwrap().len(), 1);
        assert_eq!(json["patients"][0]["lastName"], "Smith");

        let response = app
            .oneshot(get_request(
                "/api/patients?sortField=name&sortDirection=asc",
            ))
            .await
            .unwrap();
        let json = response_json(response).await;
        let last_names: Vec<&str> = json["patients"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["lastName"].as_str().unwrap())
            .collect();
        assert_eq!(last_names, vec!["Adams", "Jones", "Smith"]);
    }

    #[tokio::test]
    async fn listing_rejects_unknown_sort_and_status() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(get_request("/api/patients?sortField=id;%20DROP%20TABLE"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get_request("/api/patients?status=bogus"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["code"], "BAD_REQUEST");
        assert!(json["error"].as_str().unwrap().contains("bogus"));
    }

    #[tokio::test]
    async fn audit_logs_rejects_malformed_patient_id() {
        let app = test_router();
        let response = app
            .oneshot(get_request("/api/audit-logs?patientId=xyz"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn init_reports_schema_version() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/init")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["initialized"], true);
        assert_eq!(json["schemaVersion"], 1);
    }

    #[tokio::test]
    async fn wrong_verb_returns_405() {
        let app = test_router();
        let response = app
            .oneshot(json_request("PUT", "/api/patients", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = test_router();
        let response = app
            .oneshot(get_request("/api/nonexistent"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
