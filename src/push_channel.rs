//! Push channel client
//!
//! ## Responsibilities
//!
//! - Hold the WebSocket connection to `/api/ws/detections`
//! - Forward detection events to the dashboard; ignore every other message
//!   type
//! - Reconnect with bounded exponential backoff and jitter; after repeated
//!   consecutive failures the channel is abandoned for the session and the
//!   poll timers carry the view alone

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use rand::Rng;
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{Error, Result};
use crate::models::Detection;

/// Push message envelope. Only `type == "detection"` is acted upon.
#[derive(Debug, Deserialize)]
struct PushEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Consumer of push-arrived detections
pub trait PushHandler: Send + Sync {
    fn on_detection(&self, detection: Detection) -> impl Future<Output = ()> + Send;
}

/// Push channel tuning
#[derive(Debug, Clone)]
pub struct PushChannelConfig {
    pub url: String,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
    /// Consecutive failures before the channel is abandoned
    pub max_failures: u32,
}

enum SessionEnd {
    /// The view deactivated; shut down cleanly
    Deactivated,
    /// The peer closed or the stream ended; reconnect
    Disconnected,
}

/// Run the push channel until the view deactivates or the failure limit is
/// reached. Never surfaces an error: channel trouble degrades to pull-only.
pub async fn run<H: PushHandler>(config: PushChannelConfig, active: Arc<AtomicBool>, handler: Arc<H>) {
    let mut failures: u32 = 0;

    while active.load(Ordering::SeqCst) {
        match run_session(&config.url, &active, handler.as_ref()).await {
            Ok(SessionEnd::Deactivated) => return,
            Ok(SessionEnd::Disconnected) => {
                // The connect succeeded, so the failure streak restarts here.
                failures = 1;
                tracing::warn!("Push channel disconnected");
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(error = %e, attempt = failures, "Push channel failed");
            }
        }

        if failures >= config.max_failures {
            tracing::warn!(
                failures = failures,
                "Push channel abandoned for this session, continuing pull-only"
            );
            return;
        }

        if !active.load(Ordering::SeqCst) {
            return;
        }

        let delay = backoff_delay(&config, failures);
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Push channel reconnect scheduled");
        tokio::time::sleep(delay).await;
    }
}

/// One connection's read loop.
async fn run_session<H: PushHandler>(
    url: &str,
    active: &AtomicBool,
    handler: &H,
) -> Result<SessionEnd> {
    let (mut stream, _) = connect_async(url).await?;
    tracing::info!(url = %url, "Push channel connected");

    while let Some(frame) = stream.next().await {
        if !active.load(Ordering::SeqCst) {
            let _ = stream.close(None).await;
            return Ok(SessionEnd::Deactivated);
        }

        match frame {
            Ok(Message::Text(text)) => {
                if let Err(e) = dispatch(&text, handler).await {
                    tracing::warn!(error = %e, "Push message dropped");
                }
            }
            Ok(Message::Close(_)) => return Ok(SessionEnd::Disconnected),
            // Ping/pong and binary frames carry nothing for us.
            Ok(_) => {}
            Err(e) => return Err(Error::Channel(e.to_string())),
        }
    }

    Ok(SessionEnd::Disconnected)
}

/// Parse one text frame and hand a detection to the consumer.
async fn dispatch<H: PushHandler>(text: &str, handler: &H) -> Result<()> {
    let envelope: PushEnvelope = serde_json::from_str(text)?;

    if envelope.kind != "detection" {
        tracing::debug!(kind = %envelope.kind, "Ignoring non-detection push message");
        return Ok(());
    }

    let detection: Detection = serde_json::from_value(envelope.data)
        .map_err(|e| Error::Parse(format!("Detection payload: {}", e)))?;

    handler.on_detection(detection).await;
    Ok(())
}

/// Exponential backoff with a cap and a little jitter so reconnect storms
/// from many consoles do not line up.
fn backoff_delay(config: &PushChannelConfig, failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(16);
    let base = config
        .backoff_initial
        .saturating_mul(2u32.saturating_pow(exponent))
        .min(config.backoff_max);
    let jitter = rand::thread_rng().gen_range(0..250u64);
    base + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::sync::Mutex;

    struct CollectingHandler {
        seen: Mutex<Vec<Detection>>,
    }

    impl PushHandler for CollectingHandler {
        async fn on_detection(&self, detection: Detection) {
            self.seen.lock().await.push(detection);
        }
    }

    fn detection_json(id: &str) -> String {
        format!(
            r#"{{"type": "detection", "data": {{"id": "{}", "camera_id": "c1",
                "plate": "34ABC123", "status": "allowed", "confidence": 0.9,
                "timestamp": "{}"}}}}"#,
            id,
            Utc::now().to_rfc3339()
        )
    }

    #[tokio::test]
    async fn test_detection_message_dispatched() {
        let handler = CollectingHandler {
            seen: Mutex::new(vec![]),
        };

        dispatch(&detection_json("d1"), &handler).await.unwrap();

        let seen = handler.seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, "d1");
    }

    #[tokio::test]
    async fn test_other_message_types_ignored() {
        let handler = CollectingHandler {
            seen: Mutex::new(vec![]),
        };

        dispatch(r#"{"type": "heartbeat", "data": {}}"#, &handler)
            .await
            .unwrap();

        assert!(handler.seen.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_messages_are_errors_not_panics() {
        let handler = CollectingHandler {
            seen: Mutex::new(vec![]),
        };

        assert!(dispatch("not json at all", &handler).await.is_err());
        assert!(
            dispatch(r#"{"type": "detection", "data": {"garbage": true}}"#, &handler)
                .await
                .is_err()
        );
        assert!(handler.seen.lock().await.is_empty());
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = PushChannelConfig {
            url: "ws://test".to_string(),
            backoff_initial: Duration::from_secs(1),
            backoff_max: Duration::from_secs(30),
            max_failures: 6,
        };

        let first = backoff_delay(&config, 1);
        assert!(first >= Duration::from_secs(1));
        assert!(first < Duration::from_millis(1250));

        let fourth = backoff_delay(&config, 4);
        assert!(fourth >= Duration::from_secs(8));

        let huge = backoff_delay(&config, 12);
        assert!(huge <= Duration::from_secs(30) + Duration::from_millis(250));
    }
}
