use crate::buttons::report_bits;
use crate::device::{ButtonId, OutboundReport, TargetId, TargetState};
use crate::error::{BridgeError, Result};
use crate::platform::{FeedbackCallback, VirtualPadService};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisCode, AttributeSet, BusType, EventType, InputEvent, InputId, KeyCode,
    UinputAbsSetup,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

/// Report button -> uinput key, in the xpad driver's layout.
const KEY_MAP: [(ButtonId, KeyCode); 11] = [
    (ButtonId::A, KeyCode::BTN_SOUTH),
    (ButtonId::B, KeyCode::BTN_EAST),
    (ButtonId::X, KeyCode::BTN_NORTH),
    (ButtonId::Y, KeyCode::BTN_WEST),
    (ButtonId::L, KeyCode::BTN_TL),
    (ButtonId::R, KeyCode::BTN_TR),
    (ButtonId::Minus, KeyCode::BTN_SELECT),
    (ButtonId::Plus, KeyCode::BTN_START),
    (ButtonId::Home, KeyCode::BTN_MODE),
    (ButtonId::LStick, KeyCode::BTN_THUMBL),
    (ButtonId::RStick, KeyCode::BTN_THUMBR),
];

/// Linux implementation: one uinput device per target, shaped like an xpad pad.
///
/// uinput force feedback needs an upload/erase handshake on the device fd that
/// is not wired up, so no feedback is ever reported.
pub struct LinuxPadService {
    devices: Mutex<HashMap<u32, VirtualDevice>>,
    next_id: AtomicU32,
}

impl LinuxPadService {
    pub fn new() -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    fn create_device(&self) -> std::io::Result<VirtualDevice> {
        let mut keys = AttributeSet::<KeyCode>::new();
        for (_, key) in KEY_MAP {
            keys.insert(key);
        }

        let stick = || AbsInfo::new(0, i16::MIN.into(), i16::MAX.into(), 16, 128, 0);
        let trigger = || AbsInfo::new(0, 0, u8::MAX.into(), 0, 0, 0);
        let dpad = || AbsInfo::new(0, -1, 1, 0, 0, 0);

        #[allow(deprecated)]
        let mut builder = VirtualDeviceBuilder::new()?
            .name("Pro Controller (X360 bridge)")
            .input_id(InputId::new(BusType::BUS_USB, 0x045e, 0x028e, 0x0110))
            .with_keys(&keys)?;

        for (axis, info) in [
            (AbsoluteAxisCode::ABS_X, stick()),
            (AbsoluteAxisCode::ABS_Y, stick()),
            (AbsoluteAxisCode::ABS_RX, stick()),
            (AbsoluteAxisCode::ABS_RY, stick()),
            (AbsoluteAxisCode::ABS_Z, trigger()),
            (AbsoluteAxisCode::ABS_RZ, trigger()),
            (AbsoluteAxisCode::ABS_HAT0X, dpad()),
            (AbsoluteAxisCode::ABS_HAT0Y, dpad()),
        ] {
            builder = builder.with_absolute_axis(&UinputAbsSetup::new(axis, info))?;
        }

        builder.build()
    }
}

fn abs(axis: AbsoluteAxisCode, value: i32) -> InputEvent {
    InputEvent::new(EventType::ABSOLUTE.0, axis.0, value)
}

/// evdev Y axes grow downwards, XInput Y axes grow upwards.
fn flip_y(value: i16) -> i32 {
    (-i32::from(value)).min(i32::from(i16::MAX))
}

fn hat(report: &OutboundReport, negative: ButtonId, positive: ButtonId) -> i32 {
    let pressed = |b: ButtonId| report.buttons & report_bits(b) != 0;
    match (pressed(negative), pressed(positive)) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

/// Translate a report into the uinput events that reproduce it.
pub fn report_events(report: &OutboundReport) -> Vec<InputEvent> {
    let mut events: Vec<InputEvent> = KEY_MAP
        .iter()
        .map(|(button, key)| {
            let down = report.buttons & report_bits(*button) != 0;
            InputEvent::new(EventType::KEY.0, key.0, i32::from(down))
        })
        .collect();

    events.extend([
        abs(AbsoluteAxisCode::ABS_X, report.thumb_lx.into()),
        abs(AbsoluteAxisCode::ABS_Y, flip_y(report.thumb_ly)),
        abs(AbsoluteAxisCode::ABS_RX, report.thumb_rx.into()),
        abs(AbsoluteAxisCode::ABS_RY, flip_y(report.thumb_ry)),
        abs(AbsoluteAxisCode::ABS_Z, report.left_trigger.into()),
        abs(AbsoluteAxisCode::ABS_RZ, report.right_trigger.into()),
        abs(
            AbsoluteAxisCode::ABS_HAT0X,
            hat(report, ButtonId::DPadLeft, ButtonId::DPadRight),
        ),
        abs(
            AbsoluteAxisCode::ABS_HAT0Y,
            hat(report, ButtonId::DPadUp, ButtonId::DPadDown),
        ),
    ]);
    events
}

impl VirtualPadService for LinuxPadService {
    fn register_target(&self) -> Result<TargetId> {
        let device = self
            .create_device()
            .map_err(|e| BridgeError::PluginFailed(format!("uinput: {}", e)))?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, device);
        log::debug!("Created uinput pad for target#{}", id);
        Ok(TargetId(id))
    }

    fn unplug(&self, target: TargetId) -> Result<()> {
        // Dropping the VirtualDevice destroys the uinput node
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&target.0);
        Ok(())
    }

    fn submit_report(&self, target: TargetId, report: &OutboundReport) -> Result<()> {
        let mut devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
        let device = devices
            .get_mut(&target.0)
            .ok_or_else(|| BridgeError::VirtualPad(format!("{} is not plugged in", target)))?;
        device
            .emit(&report_events(report))
            .map_err(|e| BridgeError::VirtualPad(format!("uinput emit: {}", e)))
    }

    fn target_state(&self, target: TargetId) -> TargetState {
        let devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
        if devices.contains_key(&target.0) {
            TargetState::Connected
        } else {
            TargetState::Disconnected
        }
    }

    fn on_feedback(&self, _callback: FeedbackCallback) {
        log::info!("uinput pads report no force feedback; callback ignored");
    }
}
