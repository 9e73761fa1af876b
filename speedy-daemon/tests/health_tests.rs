//! Health aggregation tests.

use speedy_core::pipeline::HealthStatus;
use speedy_daemon::health::{ModuleHealth, aggregate_status};

fn module(name: &str, status: HealthStatus) -> ModuleHealth {
    ModuleHealth {
        name: name.to_string(),
        status,
    }
}

#[test]
fn test_aggregate_status_all_healthy() {
    // Given: Both modules are healthy
    let modules = vec![
        module("capture", HealthStatus::Healthy),
        module("aggregator", HealthStatus::Healthy),
    ];

    // When/Then: The daemon is healthy
    assert!(aggregate_status(&modules).is_healthy());
}

#[test]
fn test_aggregate_status_one_degraded() {
    // Given: The aggregator is failing to write
    let modules = vec![
        module("capture", HealthStatus::Healthy),
        module(
            "aggregator",
            HealthStatus::Degraded("3 consecutive sink failures".to_string()),
        ),
    ];

    // When: Aggregating status
    let status = aggregate_status(&modules);

    // Then: Degraded, with the module name and reason
    match status {
        HealthStatus::Degraded(reason) => {
            assert!(reason.contains("aggregator"));
            assert!(reason.contains("sink failures"));
        }
        other => panic!("expected Degraded status, got: {:?}", other),
    }
}

#[test]
fn test_aggregate_status_unhealthy_wins_over_degraded() {
    // Given: One degraded and one unhealthy module
    let modules = vec![
        module("capture", HealthStatus::Unhealthy("capture read failed".to_string())),
        module("aggregator", HealthStatus::Degraded("frame stream closed".to_string())),
    ];

    // When: Aggregating status
    let status = aggregate_status(&modules);

    // Then: Unhealthy, and only the unhealthy reason is reported
    match status {
        HealthStatus::Unhealthy(reason) => {
            assert_eq!(reason, "capture: capture read failed");
        }
        other => panic!("expected Unhealthy status, got: {:?}", other),
    }
}

#[test]
fn test_aggregate_status_degraded_after_unhealthy_is_ignored() {
    let modules = vec![
        module("aggregator", HealthStatus::Degraded("frame stream closed".to_string())),
        module("capture", HealthStatus::Unhealthy("not running".to_string())),
    ];

    let status = aggregate_status(&modules);
    assert_eq!(
        status,
        HealthStatus::Unhealthy("capture: not running".to_string())
    );
}

#[test]
fn test_aggregate_status_multiple_unhealthy_reasons_joined() {
    let modules = vec![
        module("capture", HealthStatus::Unhealthy("not running".to_string())),
        module("aggregator", HealthStatus::Unhealthy("not started".to_string())),
    ];

    let status = aggregate_status(&modules);
    assert_eq!(
        status,
        HealthStatus::Unhealthy("capture: not running; aggregator: not started".to_string())
    );
}

#[test]
fn test_aggregate_status_empty_is_healthy() {
    assert!(aggregate_status(&[]).is_healthy());
}
