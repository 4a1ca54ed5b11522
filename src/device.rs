use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Nintendo USB vendor id.
pub const NINTENDO_VENDOR_ID: u16 = 0x057E;
/// Switch Pro Controller product id.
pub const PRO_CONTROLLER_ID: u16 = 0x2009;

/// A physical controller as reported by an external discovery pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Platform HID path (e.g. "/dev/hidraw3" or "\\?\HID#VID_057E&PID_2009...")
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: Option<String>,
    pub product_name: Option<String>,
}

impl DeviceDescriptor {
    pub fn new(path: impl Into<String>, vendor_id: u16, product_id: u16) -> Self {
        Self {
            path: path.into(),
            vendor_id,
            product_id,
            serial_number: None,
            product_name: None,
        }
    }

    pub fn is_pro_controller(&self) -> bool {
        self.vendor_id == NINTENDO_VENDOR_ID && self.product_id == PRO_CONTROLLER_ID
    }

    pub fn display_name(&self) -> String {
        self.product_name
            .clone()
            .unwrap_or_else(|| format!("{:04x}:{:04x}", self.vendor_id, self.product_id))
    }
}

impl From<&hidapi::DeviceInfo> for DeviceDescriptor {
    fn from(info: &hidapi::DeviceInfo) -> Self {
        Self {
            path: info.path().to_string_lossy().into_owned(),
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            serial_number: info.serial_number().map(str::to_owned),
            product_name: info.product_string().map(str::to_owned),
        }
    }
}

/// Logical buttons of the Pro Controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Plus,
    Minus,
    L,
    R,
    LZ,
    RZ,
    LStick,
    RStick,
    Home,
    Share,
    A,
    B,
    X,
    Y,
    None,
}

impl ButtonId {
    pub fn name(self) -> &'static str {
        match self {
            ButtonId::A => "A",
            ButtonId::B => "B",
            ButtonId::X => "X",
            ButtonId::Y => "Y",
            ButtonId::LStick => "Left Stick",
            ButtonId::RStick => "Right Stick",
            ButtonId::L => "L",
            ButtonId::LZ => "LZ",
            ButtonId::R => "R",
            ButtonId::RZ => "RZ",
            ButtonId::Home => "Home",
            ButtonId::Share => "Share",
            ButtonId::Plus => "Plus",
            ButtonId::Minus => "Minus",
            ButtonId::DPadUp => "DPad Up",
            ButtonId::DPadDown => "DPad Down",
            ButtonId::DPadLeft => "DPad Left",
            ButtonId::DPadRight => "DPad Right",
            ButtonId::None => "None",
        }
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which of the three button bytes of an input frame a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonSource {
    Left,
    Middle,
    Right,
}

/// Xbox 360 report submitted to the virtual gamepad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutboundReport {
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

/// Identity the virtual gamepad service hands out for a plugged target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u32);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Connected,
    Disconnected,
    Unknown,
}

/// Rumble / player LED values last sent by the host for a virtual target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub led_number: u8,
    pub large_motor: u8,
    pub small_motor: u8,
}

/// Unique id for a bridged controller session (stable for its lifetime)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
