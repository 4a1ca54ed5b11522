//! Pro Controller input frame decoding.
//!
//! # Frame layout
//! | Offset | Size | Field          |
//! |--------|------|----------------|
//! | 0      | 8    | header         |
//! | 8      | 5    | unknown        |
//! | 13     | 1    | right buttons  |
//! | 14     | 1    | middle buttons |
//! | 15     | 1    | left buttons   |
//! | 16     | 6    | sticks         |
//!
//! Each stick is 3 bytes holding two 12-bit samples, nibble-interleaved.
//! Only the top 8 bits of X and the high byte of Y are used.

use crate::error::{BridgeError, Result};

/// First byte of a reply that carries no new input state.
pub const NO_DATA: u8 = 0x30;

pub const RIGHT_BUTTONS_OFFSET: usize = 13;
pub const MIDDLE_BUTTONS_OFFSET: usize = 14;
pub const LEFT_BUTTONS_OFFSET: usize = 15;
pub const STICKS_OFFSET: usize = 16;
pub const STICKS_LEN: usize = 6;

/// Fixed size of an input frame.
pub const FRAME_LEN: usize = STICKS_OFFSET + STICKS_LEN;

/// Button bytes and axis samples of one input frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsedInput {
    pub right_buttons: u8,
    pub middle_buttons: u8,
    pub left_buttons: u8,
    pub left_x: u8,
    pub left_y: u8,
    pub right_x: u8,
    pub right_y: u8,
}

/// Rebuild an 8-bit axis sample from the high nibble of `lo` and the low nibble of `hi`.
pub fn decode_axis(lo: u8, hi: u8) -> u8 {
    ((hi & 0x0F) << 4) | ((lo & 0xF0) >> 4)
}

fn lerp(min: f64, max: f64, t: f64) -> f64 {
    (1.0 - t) * min + t * max
}

/// Rescale an 8-bit axis sample onto the full `i16` range.
pub fn expand_to_i16(sample: u8) -> i16 {
    let t = (f64::from(sample) / f64::from(u8::MAX)).clamp(0.0, 1.0);
    lerp(f64::from(i16::MIN), f64::from(i16::MAX), t).round() as i16
}

/// Decode a raw input reply. `Ok(None)` means the controller had nothing new.
pub fn decode_frame(raw: &[u8]) -> Result<Option<ParsedInput>> {
    if raw.first() == Some(&NO_DATA) {
        return Ok(None);
    }
    if raw.len() < FRAME_LEN {
        return Err(BridgeError::Decode {
            got: raw.len(),
            need: FRAME_LEN,
        });
    }

    let sticks = &raw[STICKS_OFFSET..STICKS_OFFSET + STICKS_LEN];
    Ok(Some(ParsedInput {
        right_buttons: raw[RIGHT_BUTTONS_OFFSET],
        middle_buttons: raw[MIDDLE_BUTTONS_OFFSET],
        left_buttons: raw[LEFT_BUTTONS_OFFSET],
        left_x: decode_axis(sticks[0], sticks[1]),
        left_y: sticks[2],
        right_x: decode_axis(sticks[3], sticks[4]),
        right_y: sticks[5],
    }))
}
