pub mod buttons;
pub mod channel;
pub mod config;
pub mod device;
pub mod error;
pub mod hid;
pub mod input_loop;
pub mod platform;
pub mod registry;
pub mod report;
pub mod session;
pub mod state;
mod vigem;

pub use config::BridgeConfig;
pub use device::{
    ButtonId, ButtonSource, DeviceDescriptor, Feedback, OutboundReport, SessionId, TargetId,
    TargetState,
};
pub use error::{BridgeError, Result};
pub use hid::HidApiOpener;
pub use platform::{create_pad_service, HidTransport, TransportOpener, VirtualPadService};
pub use registry::SessionRegistry;
pub use session::{DeviceSession, SessionState};
pub use state::Bridge;
