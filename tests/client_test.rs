use incident_tracker::client::{ClientError, IncidentClient};
use incident_tracker::models::{IncidentSource, IncidentStatus};
use mockito::Matcher;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

fn incident_json(id: Uuid, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "description": "Server down",
        "status": status,
        "source": "monitoring",
        "created_at": "2024-05-01T12:00:00Z"
    })
}

#[tokio::test]
async fn test_create_posts_description_and_source() {
    let mut server = mockito::Server::new_async().await;
    let id = Uuid::new_v4();

    let mock = server
        .mock("POST", "/incidents/")
        .match_body(Matcher::Json(json!({
            "description": "Server down",
            "source": "monitoring"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(incident_json(id, "open").to_string())
        .create_async()
        .await;

    let client = IncidentClient::new(server.url()).unwrap();
    let incident = assert_ok!(client.create("Server down", IncidentSource::Monitoring).await);

    assert_eq!(incident.id, id);
    assert_eq!(incident.status, IncidentStatus::Open);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_passes_status_filter() {
    let mut server = mockito::Server::new_async().await;
    let id = Uuid::new_v4();

    let mock = server
        .mock("GET", "/incidents/")
        .match_query(Matcher::UrlEncoded("status".into(), "in_progress".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([incident_json(id, "in_progress")]).to_string())
        .create_async()
        .await;

    let client = IncidentClient::new(server.url()).unwrap();
    let incidents = assert_ok!(client.list(Some(IncidentStatus::InProgress)).await);

    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].status, IncidentStatus::InProgress);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_status_sends_patch() {
    let mut server = mockito::Server::new_async().await;
    let id = Uuid::new_v4();

    let mock = server
        .mock("PATCH", format!("/incidents/{}/status", id).as_str())
        .match_body(Matcher::Json(json!({ "status": "resolved" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(incident_json(id, "resolved").to_string())
        .create_async()
        .await;

    let client = IncidentClient::new(server.url()).unwrap();
    let incident = assert_ok!(client.update_status(id, IncidentStatus::Resolved).await);

    assert_eq!(incident.status, IncidentStatus::Resolved);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_body_is_decoded() {
    let mut server = mockito::Server::new_async().await;
    let id = Uuid::new_v4();

    server
        .mock("PATCH", format!("/incidents/{}/status", id).as_str())
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "error": {
                    "code": "INVALID_TRANSITION",
                    "message": "Invalid status transition from resolved to open",
                    "status": 400
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = IncidentClient::new(server.url()).unwrap();
    let err = assert_err!(client.update_status(id, IncidentStatus::Open).await);

    match err {
        ClientError::Api {
            status,
            code,
            message,
        } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(code, "INVALID_TRANSITION");
            assert_eq!(message, "Invalid status transition from resolved to open");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_kept_verbatim() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/health")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let client = IncidentClient::new(server.url()).unwrap();
    let err = assert_err!(client.health().await);

    match err {
        ClientError::Api { status, code, message } => {
            assert_eq!(status.as_u16(), 502);
            assert_eq!(code, "UNKNOWN");
            assert_eq!(message, "bad gateway");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_returns_confirmation() {
    let mut server = mockito::Server::new_async().await;
    let id = Uuid::new_v4();

    let mock = server
        .mock("DELETE", format!("/incidents/{}", id).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Incident deleted successfully"}"#)
        .create_async()
        .await;

    let client = IncidentClient::new(server.url()).unwrap();
    let body = assert_ok!(client.delete(id).await);

    assert_eq!(body["detail"], "Incident deleted successfully");
    mock.assert_async().await;
}
