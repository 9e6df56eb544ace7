use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::{Probe, Prober, Service};

struct Fixed(bool);

#[async_trait]
impl Service for Fixed {
    async fn is_alive(&self) -> bool {
        self.0
    }
}

struct Hanging;

#[async_trait]
impl Service for Hanging {
    async fn is_alive(&self) -> bool {
        tokio::time::sleep(Duration::from_secs(5)).await;
        true
    }
}

#[tokio::test]
async fn test_without_services_is_not_alive() {
    let probe = Probe::new(Duration::from_millis(100));
    assert!(!probe.is_alive().await);
}

#[tokio::test]
async fn test_all_services_must_be_alive() {
    let probe = Probe::new(Duration::from_millis(100));

    probe.watch(vec![Arc::new(Fixed(true)), Arc::new(Fixed(true))]);
    assert!(probe.is_alive().await);

    probe.watch(vec![Arc::new(Fixed(true)), Arc::new(Fixed(false))]);
    assert!(!probe.is_alive().await);
}

#[tokio::test]
async fn test_slow_service_fails_the_probe() {
    let probe = Probe::new(Duration::from_millis(50));
    probe.watch(vec![Arc::new(Hanging)]);
    assert!(!probe.is_alive().await);
}

#[test]
fn test_too_short_timeout_is_raised() {
    assert_eq!(Probe::new(Duration::ZERO).timeout(), Duration::from_millis(10));
}
