//! DMX frame buffer shared between the pattern runner and the transmitter.
//!
//! Uses the same `critical-section` + `RefCell` pairing as a bounded channel:
//! every single-channel write and every whole-frame snapshot is one critical
//! section. A snapshot taken between two writes of one pattern step sees a
//! partially updated frame, which is accepted.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::config::GlobalChannels;

/// Number of addressable fixture channels.
pub const CHANNEL_COUNT: usize = 33;

/// Length of one transmitted frame: start code plus every channel slot.
pub const FRAME_LEN: usize = CHANNEL_COUNT + 1;

/// Start code sent in slot 0 of every frame.
pub const START_CODE: u8 = 0;

/// Current output state of every channel.
pub struct FrameBuffer {
    slots: Mutex<RefCell<[u8; FRAME_LEN]>>,
}

impl FrameBuffer {
    /// Create a blank frame.
    pub const fn new() -> Self {
        let mut slots = [0; FRAME_LEN];
        slots[0] = START_CODE;
        Self {
            slots: Mutex::new(RefCell::new(slots)),
        }
    }

    /// Set a channel (1-based) to a value.
    ///
    /// Indices outside `1..=CHANNEL_COUNT` are ignored and the value is
    /// clamped into `0..=255`.
    pub fn set_channel(&self, channel: usize, value: i32) {
        if !(1..=CHANNEL_COUNT).contains(&channel) {
            return;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.clamp(0, 255) as u8;
        critical_section::with(|cs| {
            self.slots.borrow(cs).borrow_mut()[channel] = value;
        });
    }

    /// Read a channel (1-based). Returns `None` for out-of-range indices.
    pub fn channel(&self, channel: usize) -> Option<u8> {
        if !(1..=CHANNEL_COUNT).contains(&channel) {
            return None;
        }
        Some(critical_section::with(|cs| {
            self.slots.borrow(cs).borrow()[channel]
        }))
    }

    /// Zero every channel slot. The start code is left untouched.
    pub fn reset_all(&self) {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow(cs).borrow_mut();
            slots[1..].fill(0);
        });
    }

    /// Zero every channel, then reassert the global channels.
    pub fn reset_with_globals(&self, globals: &GlobalChannels) {
        self.reset_all();
        globals.apply(self);
    }

    /// Copy out the whole frame, start code included.
    pub fn snapshot(&self) -> [u8; FRAME_LEN] {
        critical_section::with(|cs| *self.slots.borrow(cs).borrow())
    }

    /// Whether every channel slot is zero.
    pub fn is_blank(&self) -> bool {
        self.snapshot()[1..].iter().all(|&value| value == 0)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
