use crate::device::{ButtonId, ButtonSource, OutboundReport};
use crate::report::{expand_to_i16, ParsedInput};

/// Bit i of the right button byte.
const RIGHT_BITMAP: [ButtonId; 8] = [
    ButtonId::Y,
    ButtonId::X,
    ButtonId::B,
    ButtonId::A,
    ButtonId::None, // SR
    ButtonId::None, // SL
    ButtonId::R,
    ButtonId::RZ,
];

/// Bit i of the middle button byte.
const MIDDLE_BITMAP: [ButtonId; 8] = [
    ButtonId::Minus,
    ButtonId::Plus,
    ButtonId::RStick,
    ButtonId::LStick,
    ButtonId::Home,
    ButtonId::Share,
    ButtonId::None,
    ButtonId::None, // charging grip
];

/// Bit i of the left button byte.
const LEFT_BITMAP: [ButtonId; 8] = [
    ButtonId::DPadDown,
    ButtonId::DPadUp,
    ButtonId::DPadRight,
    ButtonId::DPadLeft,
    ButtonId::None, // SR
    ButtonId::None, // SL
    ButtonId::L,
    ButtonId::LZ,
];

pub fn bitmap(source: ButtonSource) -> &'static [ButtonId; 8] {
    match source {
        ButtonSource::Left => &LEFT_BITMAP,
        ButtonSource::Middle => &MIDDLE_BITMAP,
        ButtonSource::Right => &RIGHT_BITMAP,
    }
}

/// Xbox 360 `wButtons` bit for a logical button (0 when the button has no slot).
pub fn report_bits(button: ButtonId) -> u16 {
    match button {
        ButtonId::DPadUp => 0x0001,
        ButtonId::DPadDown => 0x0002,
        ButtonId::DPadLeft => 0x0004,
        ButtonId::DPadRight => 0x0008,
        ButtonId::Plus => 0x0010,
        ButtonId::Minus => 0x0020,
        ButtonId::LStick => 0x0040,
        ButtonId::RStick => 0x0080,
        ButtonId::L => 0x0100,
        ButtonId::R => 0x0200,
        ButtonId::Home => 0x0400, // undocumented guide bit
        ButtonId::A => 0x1000,
        ButtonId::B => 0x2000,
        ButtonId::X => 0x4000,
        ButtonId::Y => 0x8000,
        ButtonId::LZ | ButtonId::RZ | ButtonId::Share | ButtonId::None => 0x0000,
    }
}

/// Append one `(button, pressed)` row per mapped bit of `byte`.
pub fn extract_buttons(byte: u8, source: ButtonSource, out: &mut Vec<(ButtonId, bool)>) {
    for (i, &button) in bitmap(source).iter().enumerate() {
        if button == ButtonId::None {
            continue;
        }
        out.push((button, byte & (1 << i) != 0));
    }
}

/// Fold pressed buttons into `report`. Triggers are all-or-nothing.
pub fn apply_to_report(buttons: &[(ButtonId, bool)], report: &mut OutboundReport) {
    for &(button, pressed) in buttons {
        if !pressed {
            continue;
        }
        match button {
            ButtonId::LZ => report.left_trigger = u8::MAX,
            ButtonId::RZ => report.right_trigger = u8::MAX,
            other => report.buttons |= report_bits(other),
        }
    }
}

/// All button rows of a frame, left group first.
pub fn collect_buttons(input: &ParsedInput) -> Vec<(ButtonId, bool)> {
    let mut buttons = Vec::with_capacity(24);
    extract_buttons(input.left_buttons, ButtonSource::Left, &mut buttons);
    extract_buttons(input.right_buttons, ButtonSource::Right, &mut buttons);
    extract_buttons(input.middle_buttons, ButtonSource::Middle, &mut buttons);
    buttons
}

/// Build a fresh Xbox 360 report from a decoded frame.
pub fn build_report(input: &ParsedInput) -> OutboundReport {
    let mut report = OutboundReport {
        thumb_lx: expand_to_i16(input.left_x),
        thumb_ly: expand_to_i16(input.left_y),
        thumb_rx: expand_to_i16(input.right_x),
        thumb_ry: expand_to_i16(input.right_y),
        ..OutboundReport::default()
    };

    let buttons = collect_buttons(input);
    if log::log_enabled!(log::Level::Trace) {
        let pressed: Vec<&str> = buttons
            .iter()
            .filter(|(_, pressed)| *pressed)
            .map(|(button, _)| button.name())
            .collect();
        if !pressed.is_empty() {
            log::trace!("Pressed: {}", pressed.join(" "));
        }
    }
    apply_to_report(&buttons, &mut report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCES: [ButtonSource; 3] = [ButtonSource::Left, ButtonSource::Middle, ButtonSource::Right];

    #[test]
    fn idle_byte_presses_nothing() {
        for source in SOURCES {
            let mut out = Vec::new();
            extract_buttons(0x00, source, &mut out);
            assert!(out.iter().all(|(_, pressed)| !pressed), "{source:?}");
        }
    }

    #[test]
    fn full_byte_presses_every_mapped_bit() {
        for source in SOURCES {
            let mut out = Vec::new();
            extract_buttons(0xFF, source, &mut out);
            let expected: Vec<(ButtonId, bool)> = bitmap(source)
                .iter()
                .filter(|b| **b != ButtonId::None)
                .map(|b| (*b, true))
                .collect();
            assert_eq!(out, expected, "{source:?}");
        }
    }

    #[test]
    fn unmapped_bits_are_skipped() {
        let mut out = Vec::new();
        // SR + SL on the right grip
        extract_buttons(0x30, ButtonSource::Right, &mut out);
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|(_, pressed)| !pressed));
    }

    #[test]
    fn trigger_sets_trigger_only() {
        let mut report = OutboundReport::default();
        apply_to_report(&[(ButtonId::LZ, true)], &mut report);
        assert_eq!(report.left_trigger, u8::MAX);
        assert_eq!(report.right_trigger, 0);
        assert_eq!(report.buttons, 0);

        apply_to_report(&[(ButtonId::RZ, true)], &mut report);
        assert_eq!(report.right_trigger, u8::MAX);
        assert_eq!(report.buttons, 0);
    }

    #[test]
    fn face_button_sets_bit_only() {
        let mut report = OutboundReport::default();
        apply_to_report(&[(ButtonId::A, true)], &mut report);
        assert_eq!(report.buttons, 0x1000);
        assert_eq!(report.left_trigger, 0);
        assert_eq!(report.right_trigger, 0);
    }

    #[test]
    fn released_and_unmapped_buttons_do_nothing() {
        let mut report = OutboundReport::default();
        apply_to_report(
            &[(ButtonId::B, false), (ButtonId::Share, true), (ButtonId::LZ, false)],
            &mut report,
        );
        assert_eq!(report, OutboundReport::default());
    }

    #[test]
    fn report_bits_match_xusb_layout() {
        assert_eq!(report_bits(ButtonId::DPadUp), 0x0001);
        assert_eq!(report_bits(ButtonId::Plus), 0x0010);
        assert_eq!(report_bits(ButtonId::R), 0x0200);
        assert_eq!(report_bits(ButtonId::Home), 0x0400);
        assert_eq!(report_bits(ButtonId::Y), 0x8000);
        assert_eq!(report_bits(ButtonId::Share), 0);
    }
}
