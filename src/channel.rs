//! Request/response exchange with a physical Pro Controller.
//!
//! Every command is written as a raw output report and answered by exactly
//! one input report. The controller drops commands that arrive too quickly,
//! so consecutive writes are spaced by at least `min_command_interval`.

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::platform::HidTransport;
use std::time::{Duration, Instant};

pub const GET_STATUS: [u8; 2] = [0x80, 0x01];
pub const HANDSHAKE: [u8; 2] = [0x80, 0x02];
pub const SWITCH_BAUDRATE: [u8; 2] = [0x80, 0x03];
pub const HID_ONLY_MODE: [u8; 2] = [0x80, 0x04];
pub const DISCONNECT: [u8; 2] = [0x80, 0x05];

pub const SUBCOMMAND_REPORT_ID: u8 = 0x01;
pub const RUMBLE_SUBCOMMAND: u8 = 0x48;
pub const IMU_SUBCOMMAND: u8 = 0x40;
pub const LED_SUBCOMMAND: u8 = 0x30;
const ENABLE: [u8; 1] = [0x01];

pub const GET_INPUT: u8 = 0x1f;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Handshaking,
    Ready,
}

pub struct CommandChannel {
    transport: Box<dyn HidTransport>,
    state: ChannelState,
    min_interval: Duration,
    read_timeout_ms: i32,
    last_command: Option<Instant>,
}

impl CommandChannel {
    pub fn new(transport: Box<dyn HidTransport>, config: &BridgeConfig) -> Self {
        Self {
            transport,
            state: ChannelState::Disconnected,
            min_interval: config.min_command_interval(),
            read_timeout_ms: config.read_timeout_ms,
            last_command: None,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    fn set_state(&mut self, state: ChannelState) {
        if self.state != state {
            log::debug!("Command channel {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Sleep off whatever is left of the spacing window since the last write.
    fn wait_for_spacing(&self) {
        if let Some(last) = self.last_command {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
    }

    /// Write `payload` and block for the reply (bounded by the read timeout).
    pub fn exchange(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        self.wait_for_spacing();
        let written = self.transport.write(payload);
        self.last_command = Some(Instant::now());
        written?;

        let reply = self.transport.read_timeout(self.read_timeout_ms)?;
        if reply.is_empty() {
            return Err(BridgeError::Io(format!(
                "no reply to {:02x?} within {} ms",
                payload, self.read_timeout_ms
            )));
        }
        log::trace!("{:02x?} -> {} byte reply", payload, reply.len());
        Ok(reply)
    }

    /// Frame `[command, payload...]` and exchange it.
    pub fn send_command(&mut self, command: u8, payload: &[u8]) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(1 + payload.len());
        buf.push(command);
        buf.extend_from_slice(payload);
        self.exchange(&buf)
    }

    /// Frame `[report_id, subcommand, payload...]` and exchange it.
    pub fn send_subcommand(&mut self, report_id: u8, subcommand: u8, payload: &[u8]) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(2 + payload.len());
        buf.push(report_id);
        buf.push(subcommand);
        buf.extend_from_slice(payload);
        self.exchange(&buf)
    }

    /// Bring a freshly opened controller into HID input mode.
    ///
    /// Only the first handshake must be answered. The baud switch, the repeated
    /// handshake, HID-only mode and the feature subcommands are tolerated to fail
    /// unless `config.strict_handshake` is set. Returns the controller MAC when
    /// the status query answered with one.
    pub fn handshake(&mut self, config: &BridgeConfig) -> Result<Option<[u8; 6]>> {
        self.set_state(ChannelState::Handshaking);
        match self.run_handshake(config) {
            Ok(mac) => {
                self.set_state(ChannelState::Ready);
                Ok(mac)
            }
            Err(e) => {
                self.set_state(ChannelState::Disconnected);
                Err(e)
            }
        }
    }

    fn run_handshake(&mut self, config: &BridgeConfig) -> Result<Option<[u8; 6]>> {
        let mac = match self.exchange(&GET_STATUS) {
            Ok(reply) => parse_mac(&reply),
            Err(e) => {
                log::debug!("Status query unanswered: {}", e);
                None
            }
        };

        self.exchange(&HANDSHAKE)
            .map_err(|e| BridgeError::HandshakeFailed(e.to_string()))?;

        for (name, frame) in [
            ("switch baudrate", SWITCH_BAUDRATE),
            ("handshake", HANDSHAKE),
            ("HID-only mode", HID_ONLY_MODE),
        ] {
            self.best_effort(config, name, |ch| ch.exchange(&frame))?;
        }

        let led = [config.led_pattern];
        self.best_effort(config, "enable rumble", |ch| {
            ch.send_subcommand(SUBCOMMAND_REPORT_ID, RUMBLE_SUBCOMMAND, &ENABLE)
        })?;
        self.best_effort(config, "enable IMU", |ch| {
            ch.send_subcommand(SUBCOMMAND_REPORT_ID, IMU_SUBCOMMAND, &ENABLE)
        })?;
        self.best_effort(config, "set LED", |ch| {
            ch.send_subcommand(SUBCOMMAND_REPORT_ID, LED_SUBCOMMAND, &led)
        })?;

        Ok(mac)
    }

    fn best_effort<F>(&mut self, config: &BridgeConfig, step: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<Vec<u8>>,
    {
        match f(self) {
            Ok(_) => Ok(()),
            Err(e) if config.strict_handshake => {
                Err(BridgeError::HandshakeFailed(format!("{}: {}", step, e)))
            }
            Err(e) => {
                log::warn!("Init step '{}' failed, continuing: {}", step, e);
                Ok(())
            }
        }
    }

    /// Best-effort disconnect; the reply (or its absence) is ignored.
    pub fn disconnect(&mut self) {
        if let Err(e) = self.exchange(&DISCONNECT) {
            log::debug!("Disconnect command unanswered: {}", e);
        }
        self.set_state(ChannelState::Disconnected);
    }
}

/// MAC address from a `0x81 0x01` status reply (sent least-significant byte first).
pub fn parse_mac(reply: &[u8]) -> Option<[u8; 6]> {
    if reply.len() < 10 || reply[0] != 0x81 || reply[1] != GET_STATUS[1] {
        return None;
    }
    let mut mac = [0u8; 6];
    for (dst, src) in mac.iter_mut().zip(reply[4..10].iter().rev()) {
        *dst = *src;
    }
    Some(mac)
}
