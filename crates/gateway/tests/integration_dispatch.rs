//! End-to-end dispatch tests against an in-process partner stub.

use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use visa_mcp_gateway::{Gateway, GatewayError, TransportFactory};
use visa_mcp_test_support::{CannedResponse, StubPartner};

fn gateway_for(stub: &StubPartner) -> Gateway {
    let transport = TransportFactory::without_identity(stub.base_url(), "testuser", "testpass")
        .expect("transport");
    Gateway::new(transport).expect("gateway")
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

#[tokio::test]
async fn hello_world_round_trip_forwards_payload_verbatim() {
    let stub = StubPartner::start(HashMap::from([(
        "/vdp/helloworld".to_string(),
        CannedResponse::ok(json!({ "message": "hello" })),
    )]))
    .await
    .expect("stub");

    let gateway = gateway_for(&stub);
    let payload = gateway
        .invoke("hello_world", Map::new())
        .await
        .expect("invoke");
    assert_eq!(payload, json!({ "message": "hello" }));

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/vdp/helloworld");
    // Basic auth with testuser:testpass, on every request.
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Basic dGVzdHVzZXI6dGVzdHBhc3M=")
    );
    assert_eq!(
        requests[0].content_type.as_deref(),
        Some("application/json")
    );
}

#[tokio::test]
async fn exchange_rate_posts_exact_wire_body() {
    let stub = StubPartner::start(HashMap::from([(
        "/forexrates/v2/foreignexchangerates".to_string(),
        CannedResponse::ok(json!({ "conversionRate": "0.92" })),
    )]))
    .await
    .expect("stub");

    let gateway = gateway_for(&stub);
    let payload = gateway
        .invoke(
            "get_exchange_rate",
            args(json!({
                "source_currency": "USD",
                "destination_currency": "EUR",
                "amount": 100.5,
            })),
        )
        .await
        .expect("invoke");
    assert_eq!(payload, json!({ "conversionRate": "0.92" }));

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(
        requests[0].body,
        Some(json!({
            "sourceCurrencyCode": "USD",
            "destinationCurrencyCode": "EUR",
            "sourceAmount": "100.5",
        }))
    );
}

#[tokio::test]
async fn atm_locator_fills_defaults_on_the_wire() {
    let stub = StubPartner::start(HashMap::from([(
        "/globalatmlocator/v1/localatms/atmLocator".to_string(),
        CannedResponse::ok(json!({ "responseData": [] })),
    )]))
    .await
    .expect("stub");

    let gateway = gateway_for(&stub);
    gateway
        .invoke(
            "find_nearby_atms",
            args(json!({ "latitude": 37.77, "longitude": -122.41 })),
        )
        .await
        .expect("invoke");

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    let body = requests[0].body.as_ref().expect("body");
    assert_eq!(
        body["requestData"]["options"]["range"],
        json!({ "distance": 5, "distanceUnit": "km" })
    );
    assert_eq!(
        body["requestData"]["options"]["sort"],
        json!({ "primary": "distance", "direction": "asc" })
    );
    assert_eq!(body["wsRequestHeaderV2"]["applicationId"], json!("VISA_MCP"));
}

#[tokio::test]
async fn add_stop_sends_only_level_matched_identifier() {
    let stub = StubPartner::start(HashMap::from([(
        "/vsps/v1/stopinstructions/add".to_string(),
        CannedResponse::ok(json!({ "stopId": "S-9" })),
    )]))
    .await
    .expect("stub");

    let gateway = gateway_for(&stub);
    gateway
        .invoke(
            "vsps_add_stop",
            args(json!({
                "pan": "4111111111111111",
                "level": "merchant",
                "merchant_id": "M-77",
                "mcc": "5968",
            })),
        )
        .await
        .expect("invoke");

    let requests = stub.requests();
    assert_eq!(
        requests[0].body,
        Some(json!({
            "pan": "4111111111111111",
            "level": "merchant",
            "merchantId": "M-77",
        }))
    );
}

#[tokio::test]
async fn partner_4xx_and_5xx_become_errors_with_status() {
    let stub = StubPartner::start(HashMap::from([
        (
            "/vsm/v1/search".to_string(),
            CannedResponse::status(400, json!({ "message": "bad pan" })),
        ),
        (
            "/vsm/v1/cancel".to_string(),
            CannedResponse::status(500, json!({ "message": "partner down" })),
        ),
    ]))
    .await
    .expect("stub");

    let gateway = gateway_for(&stub);

    let err = gateway
        .invoke("vsm_search", args(json!({ "pan": "not-a-pan" })))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Partner(_)), "got {err:?}");
    assert!(err.to_string().contains("400"), "missing status: {err}");
    assert!(err.to_string().contains("bad pan"), "missing body: {err}");

    let err = gateway
        .invoke("vsm_cancel", args(json!({ "stop_id": "S1" })))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("500"), "missing status: {err}");
}

#[tokio::test]
async fn unknown_tool_never_reaches_the_network() {
    let stub = StubPartner::start(HashMap::new()).await.expect("stub");
    let gateway = gateway_for(&stub);

    let err = gateway
        .invoke("no_such_tool", Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::UnknownTool(_)), "got {err:?}");
    assert!(err.to_string().contains("no_such_tool"));
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn slow_partner_fails_within_the_configured_timeout() {
    let stub = StubPartner::start(HashMap::from([(
        "/vdp/helloworld".to_string(),
        CannedResponse::ok(json!({ "message": "hello" })).delayed(Duration::from_secs(5)),
    )]))
    .await
    .expect("stub");

    let transport = TransportFactory::without_identity(stub.base_url(), "u", "p")
        .expect("transport")
        .with_timeout(Duration::from_millis(250));
    let gateway = Gateway::new(transport).expect("gateway");

    let started = Instant::now();
    let err = gateway.invoke("hello_world", Map::new()).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, GatewayError::Transport(_)), "got {err:?}");
    assert!(
        elapsed < Duration::from_secs(2),
        "call did not respect the timeout: {elapsed:?}"
    );
}

#[tokio::test]
async fn concurrent_invocations_do_not_interfere() {
    let stub = StubPartner::start(HashMap::from([
        (
            "/vdp/helloworld".to_string(),
            CannedResponse::ok(json!({ "message": "hello" })).delayed(Duration::from_millis(100)),
        ),
        (
            "/forexrates/v2/foreignexchangerates".to_string(),
            CannedResponse::status(500, json!({ "message": "partner down" })),
        ),
    ]))
    .await
    .expect("stub");

    let gateway = gateway_for(&stub);

    let hello = gateway.invoke("hello_world", Map::new());
    let rate = gateway.invoke(
        "get_exchange_rate",
        args(json!({
            "source_currency": "USD",
            "destination_currency": "EUR",
            "amount": 10,
        })),
    );
    let (hello, rate) = tokio::join!(hello, rate);

    assert_eq!(hello.expect("hello succeeds"), json!({ "message": "hello" }));
    let err = rate.unwrap_err();
    assert!(err.to_string().contains("500"));
    assert_eq!(stub.requests().len(), 2);
}

#[tokio::test]
async fn update_stop_merges_caller_fields_on_the_wire() {
    let stub = StubPartner::start(HashMap::from([(
        "/vsps/v1/stopinstructions/update".to_string(),
        CannedResponse::ok(json!({ "status": "ok" })),
    )]))
    .await
    .expect("stub");

    let gateway = gateway_for(&stub);
    gateway
        .invoke(
            "vsps_update_stop",
            args(json!({
                "stop_id": "S1",
                "updates": { "status": "paused" },
            })),
        )
        .await
        .expect("invoke");

    let requests = stub.requests();
    assert_eq!(
        requests[0].body,
        Some(json!({ "stopId": "S1", "status": "paused" }))
    );
}
