// Integration test against a running server
// Run with: cargo test --test integration_test -- --ignored

use serde_json::json;

const API_BASE_URL: &str = "http://localhost:9000";

#[tokio::test]
#[ignore] // Requires a running gatherly-api instance
async fn test_event_lifecycle() {
    let client = reqwest::Client::new();

    let health = client
        .get(format!("{}/health", API_BASE_URL))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(health.status(), 200);

    // Create an event
    let created = client
        .post(format!("{}/events", API_BASE_URL))
        .json(&json!({
            "groupUuid": "itest-group",
            "name": "Integration social",
            "description": "created by the integration test",
            "maxParticipants": 3,
            "eventDate": "31-12-2099 20:00",
            "publishedDate": "01-01-2025 12:00",
            "organizerUsername": "itest",
            "participate": true,
        }))
        .send()
        .await
        .expect("Failed to create event");
    assert_eq!(created.status(), 201);
    let event: serde_json::Value = created.json().await.expect("Failed to parse event");
    let uuid = event["uuid"].as_str().expect("missing uuid").to_string();
    assert_eq!(event["participants"][0]["username"], "itest");

    // Join and fetch
    let joined = client
        .post(format!("{}/events/{}/participants", API_BASE_URL, uuid))
        .json(&json!({ "username": "friend" }))
        .send()
        .await
        .expect("Failed to join");
    assert_eq!(joined.status(), 200);

    let fetched = client
        .get(format!("{}/events/{}", API_BASE_URL, uuid))
        .send()
        .await
        .expect("Failed to get event");
    assert_eq!(fetched.status(), 200);
    let event: serde_json::Value = fetched.json().await.expect("Failed to parse event");
    assert_eq!(event["participants"].as_array().unwrap().len(), 2);

    // Clean up
    let deleted = client
        .delete(format!("{}/events/{}", API_BASE_URL, uuid))
        .send()
        .await
        .expect("Failed to delete");
    assert_eq!(deleted.status(), 204);
}
