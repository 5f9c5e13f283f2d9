//! Error handling for the PlateGuard console core
//!
//! Every failure is contained at the component boundary that produced it:
//! control failures are reported to the operator and reverted, fetch and
//! channel failures are logged with prior state retained. Nothing here is
//! fatal to the view.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Camera control call failure (start/stop rejected or unreachable)
    #[error("Control call failed for camera {camera_id}: {message}")]
    ControlCall { camera_id: String, message: String },

    /// Data fetch failure (cameras/detections/stats/telemetry)
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Push channel transport failure
    #[error("Push channel error: {0}")]
    Channel(String),

    /// Payload parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket handshake/transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
