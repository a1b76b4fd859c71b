//! Integration tests for MQTT message ingestion into the relay hub.

mod common;

use assert_matches::assert_matches;
use serde_json::json;

use farmlink_api::mqtt::{ingest, MQTT_PEER_ID};
use farmlink_api::relay::RelayOutcome;
use farmlink_core::alert::AlertAction;
use farmlink_core::alerting::thresholds::ThresholdConfig;

use common::{next_frame, test_hub};

const TOPIC: &str = "farm/status";

// ---------------------------------------------------------------------------
// Test: a JSON broker message reaches every connected peer as telemetry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn json_message_is_relayed_as_telemetry() {
    let (hub, _bus) = test_hub(ThresholdConfig::default());
    let mut browser_a = hub.connect("browser-a").await;
    let mut browser_b = hub.connect("browser-b").await;

    let outcome = ingest(&hub, TOPIC, br#"{"soil": 55, "temp": 24.5}"#).await;

    assert_eq!(
        outcome,
        RelayOutcome::Forwarded {
            event: "telemetry_update".to_string(),
            recipients: 2,
        }
    );
    for rx in [&mut browser_a, &mut browser_b] {
        let frame = next_frame(rx).expect("browser should receive MQTT telemetry");
        assert_eq!(frame.event, "telemetry_update");
        assert_eq!(frame.data, json!({ "soil": 55, "temp": 24.5 }));
    }
}

// ---------------------------------------------------------------------------
// Test: broker readings drive the alert state machine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broker_readings_raise_and_clear_alerts() {
    let (hub, bus) = test_hub(ThresholdConfig::default());
    let mut alerts = bus.subscribe();

    ingest(&hub, TOPIC, br#"{"soil": 12}"#).await;
    let event = alerts.try_recv().expect("critical event published");
    assert_eq!(event.action, AlertAction::FireCritical);
    assert_eq!(event.source_peer, MQTT_PEER_ID);
    assert!(hub.alert_active());

    ingest(&hub, TOPIC, br#"{"soil": 35}"#).await;
    assert!(alerts.try_recv().is_err(), "dead band reading fires nothing");

    ingest(&hub, TOPIC, br#"{"soil": 48}"#).await;
    assert_eq!(alerts.try_recv().unwrap().action, AlertAction::FireRecovery);
    assert!(!hub.alert_active());
}

// ---------------------------------------------------------------------------
// Test: non-JSON payloads are dropped without relaying
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_json_payload_is_dropped() {
    let (hub, bus) = test_hub(ThresholdConfig::default());
    let mut alerts = bus.subscribe();
    let mut browser = hub.connect("browser").await;

    for payload in [&b"soil=12"[..], &b""[..], &[0xff, 0xfe, 0x00][..]] {
        assert_matches!(ingest(&hub, TOPIC, payload).await, RelayOutcome::Ignored);
    }

    assert!(next_frame(&mut browser).is_none());
    assert!(alerts.try_recv().is_err());
    assert!(!hub.alert_active());
}
