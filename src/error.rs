use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[error("HID I/O error: {0}")]
    Io(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Unable to plug in virtual gamepad: {0}")]
    PluginFailed(String),

    #[error("Input report too short: got {got} bytes, need {need}")]
    Decode { got: usize, need: usize },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Virtual gamepad error: {0}")]
    VirtualPad(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    #[error("System I/O error: {0}")]
    System(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Outer shells (tray, UI) surface errors as plain strings
impl Serialize for BridgeError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
