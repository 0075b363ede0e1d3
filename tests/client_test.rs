use httpmock::prelude::*;
use loghub_client::app::geocoding;
use loghub_client::domain::model::{LongRunHandle, PollingPolicy, RetryPolicy};
use loghub_client::{LogHubClient, LogHubError, OperationRequest, SaveScenario, Table};
use serde_json::json;
use std::time::Duration;

fn quick_retry(max_attempts: u32, delay_ms: u64) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        delay: Duration::from_millis(delay_ms),
    }
}

fn client(server: &MockServer) -> LogHubClient {
    LogHubClient::new(server.base_url(), "test-key").with_retry_policy(quick_retry(3, 0))
}

#[tokio::test]
async fn test_throttled_request_is_retried() {
    let server = MockServer::start_async().await;
    let throttled = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/applications/v1/geocoding");
            then.status(429);
        })
        .await;

    let client = LogHubClient::new(server.base_url(), "test-key")
        .with_retry_policy(quick_retry(3, 500));
    let request = tokio::spawn(async move {
        client
            .post_application("geocoding", "forward geocoding", &json!({"addresses": []}))
            .await
    });

    while throttled.hits_async().await == 0 {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    throttled.delete_async().await;
    let ok = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/applications/v1/geocoding");
            then.status(200).json_body(json!({"geocodes": [{"latitude": 47.0}]}));
        })
        .await;

    let response = request.await.unwrap().unwrap();
    ok.assert_async().await;
    assert_eq!(response, json!({"geocodes": [{"latitude": 47.0}]}));
}

#[tokio::test]
async fn test_retry_after_header_overrides_delay() {
    let server = MockServer::start();
    let throttled = server.mock(|when, then| {
        when.method(POST).path("/api/applications/v1/geocoding");
        then.status(429).header("Retry-After", "0");
    });

    // a one minute delay would time the test out if Retry-After were ignored
    let client = LogHubClient::new(server.base_url(), "test-key")
        .with_retry_policy(quick_retry(2, 60_000));
    let err = tokio::time::timeout(
        Duration::from_secs(10),
        client.post_application("geocoding", "forward geocoding", &json!({})),
    )
    .await
    .unwrap()
    .unwrap_err();

    throttled.assert_hits(2);
    assert!(matches!(
        err,
        LogHubError::MaxRetriesExceeded { ref application, attempts: 2 } if application == "geocoding"
    ));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start();
    let failing = server.mock(|when, then| {
        when.method(POST).path("/api/applications/v1/geocoding");
        then.status(500).body("solver unavailable");
    });

    let err = client(&server)
        .post_application("geocoding", "forward geocoding", &json!({}))
        .await
        .unwrap_err();

    failing.assert_hits(1);
    match err {
        LogHubError::Api { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "solver unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        LogHubError::Api {
            application: "geocoding".to_string(),
            status: 500,
            body: String::new()
        }
        .exit_code(),
        3
    );
}

#[tokio::test]
async fn test_transport_errors_exhaust_retries() {
    let client = LogHubClient::new("http://127.0.0.1:1", "test-key")
        .with_retry_policy(quick_retry(2, 0));

    let err = client
        .post_application("geocoding", "forward geocoding", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, LogHubError::MaxRetriesExceeded { attempts: 2, .. }));
}

#[tokio::test]
async fn test_api_key_header_sent() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/applications/v1/reversegeocoding")
            .header("authorization", "apikey test-key")
            .header("content-type", "application/json")
            .header("accept", "application/json");
        then.status(200).json_body(json!({"addresses": []}));
    });

    client(&server)
        .post_application("reversegeocoding", "reverse geocoding", &json!({"geocodes": []}))
        .await
        .unwrap();
    mock.assert();
}

#[tokio::test]
async fn test_long_run_polls_until_finished() {
    let server = MockServer::start();
    let start = server.mock(|when, then| {
        when.method(POST).path("/api/applications/v1/networkdesignpluslongrun");
        then.status(200).json_body(json!({
            "result": {"apiServer": server.base_url(), "url": "/api/v1/calculations/42"}
        }));
    });
    let status = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/calculations/42")
            .header("authorization", "apikey test-key");
        then.status(200).json_body(json!({
            "calculationRunning": false,
            "openWarehouses": [{"name": "Basel"}],
            "factoryAssignment": [],
            "customerAssignment": [{"customer": "Bern", "warehouse": "Basel"}],
            "solutionKpis": [{"totalCosts": 1200.5}]
        }));
    });

    let operation = loghub_client::app::network_design::forward();
    let request = loghub_client::app::network_design::INPUTS
        .iter()
        .fold(OperationRequest::new(), |request, (name, _)| {
            request.table(*name, Table::default())
        });

    let mut output = operation.execute(&client(&server), &request).await.unwrap();

    start.assert();
    status.assert();
    let assignment = output.take("customerAssignment").unwrap();
    assert_eq!(assignment.get(0, "warehouse"), Some(&json!("Basel")));
    assert!(output.take("factoryAssignment").unwrap().is_empty());
}

#[tokio::test]
async fn test_long_run_times_out() {
    let server = MockServer::start();
    let status = server.mock(|when, then| {
        when.method(GET).path("/calc/7");
        then.status(200)
            .json_body(json!({"calculationRunning": true, "progress": 40}));
    });

    let client = client(&server).with_polling_policy(PollingPolicy {
        interval: Duration::from_millis(10),
        timeout: Duration::ZERO,
    });
    let handle = LongRunHandle {
        api_server: server.base_url(),
        url: "calc/7".to_string(),
    };

    let err = client.poll_long_run(&handle, "location planning").await.unwrap_err();
    status.assert_hits(1);
    assert!(matches!(err, LogHubError::CalculationTimeout { .. }));
}

#[tokio::test]
async fn test_saved_scenario_fetches_map_link() {
    let server = MockServer::start();
    let run = server.mock(|when, then| {
        when.method(POST)
            .path("/api/applications/v1/geocoding")
            .json_body_partial(
                r#"{"saveScenarioParameters": {"saveScenario": true, "workspaceId": "ws-1", "scenarioName": "Q3"}}"#,
            );
        then.status(200)
            .json_body(json!({"geocodes": [{"latitude": 47.37, "longitude": 8.54}]}));
    });
    let entities = server.mock(|when, then| {
        when.method(GET).path("/api/v1/workspace/ws-1/entitiesWithTables");
        then.status(200).json_body(json!([
            {"_id": "d-1", "name": "Q3", "type": "DASHBOARD", "workspaceId": "ws-1"},
            {"_id": "m-1", "name": "Q3", "type": "MAP", "workspaceId": "ws-1"}
        ]));
    });

    let request = OperationRequest::new()
        .table(
            "addresses",
            Table::from_json(&json!([{"country": "CH", "city": "Zurich"}])).unwrap(),
        )
        .save_scenario(SaveScenario::saved("ws-1", "Q3"))
        .fetch_links(true);

    let output = geocoding::forward()
        .execute(&client(&server), &request)
        .await
        .unwrap();

    run.assert();
    entities.assert();
    let links = output.links.unwrap();
    assert_eq!(
        links.map,
        Some(format!("{}/sca/platform/workspaces/ws-1/maps/m-1", server.base_url()))
    );
}

#[tokio::test]
async fn test_unsaved_scenario_skips_links() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/applications/v1/geocoding");
        then.status(200).json_body(json!({"geocodes": []}));
    });
    let entities = server.mock(|when, then| {
        when.method(GET).path_contains("/api/v1/workspace/");
        then.status(200).json_body(json!([]));
    });

    let request = OperationRequest::new()
        .table("addresses", Table::from_json(&json!([{"country": "CH"}])).unwrap())
        .fetch_links(true);
    let output = geocoding::forward()
        .execute(&client(&server), &request)
        .await
        .unwrap();

    entities.assert_hits(0);
    assert!(output.links.is_none());
}

#[tokio::test]
async fn test_workspace_entities_object_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/workspace/ws-9/entitiesWithTables");
        then.status(200).json_body(json!({
            "map": "https://platform/maps/1",
            "dashboard": "https://platform/dashboards/2"
        }));
    });

    let links = client(&server).workspace_entities("ws-9").await.unwrap();
    assert_eq!(links.map.as_deref(), Some("https://platform/maps/1"));
    assert_eq!(links.dashboard.as_deref(), Some("https://platform/dashboards/2"));
    assert!(links.input_dataset.is_none());
}
