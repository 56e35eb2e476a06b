//! Core constants for the Latchkey access-control rig.
//!
//! Every device in the rig (keypad, door lock, RFID reader) runs its own
//! cooperative loop against its own monotonic clock. The timing constants
//! below are the reference values those loops are tuned for; each one can be
//! overridden through the per-device configuration structs.
//!
//! # Timing Overview
//!
//! | Constant | Value | Used by |
//! |----------|-------|---------|
//! | [`KEYPAD_DEBOUNCE_MS`] | 40 ms | key scanner, door sensor |
//! | [`LED_BLINK_INTERVAL_MS`] | 500 ms | blinking indicators |
//! | [`DOOR_ALERT_THRESHOLD_MS`] | 5000 ms | door-open timeout monitor |
//! | [`DEFAULT_STATE_DURATION_MS`] | 3000 ms | keypad-state records without `time` |
//! | [`RECONNECT_BACKOFF_MS`] | 2000 ms | transport reconnection |
//! | [`RFID_DEDUPE_WINDOW_MS`] | 1500 ms | RFID duplicate suppression |
//!
//! # Usage
//!
//! ```
//! use latchkey_core::constants::*;
//! use std::time::Duration;
//!
//! let window = Duration::from_millis(KEYPAD_DEBOUNCE_MS);
//! assert!(window < Duration::from_millis(LED_BLINK_INTERVAL_MS));
//! ```

// ============================================================================
// Input Timing
// ============================================================================

/// Minimum time a raw key sample must stay unchanged before it is trusted.
///
/// A sample is accepted once the time since the last raw change is strictly
/// greater than this window.
pub const KEYPAD_DEBOUNCE_MS: u64 = 40;

/// Debounce window for the door contact sensor on the door-lock device.
pub const DOOR_SENSOR_DEBOUNCE_MS: u64 = 40;

/// Delay between two iterations of a device loop.
pub const DEFAULT_IDLE_DELAY_MS: u64 = 5;

// ============================================================================
// Indicator Timing
// ============================================================================

/// Time between two level flips of a blinking indicator.
pub const LED_BLINK_INTERVAL_MS: u64 = 500;

/// Duration applied when a keypad-state record carries no `time` field.
pub const DEFAULT_STATE_DURATION_MS: u64 = 3000;

/// How long the door may stay open before the keypad raises its alert.
///
/// The alert glow lasts for the same duration and is renewed for as long as
/// the door stays open.
pub const DOOR_ALERT_THRESHOLD_MS: u64 = 5000;

// ============================================================================
// Transport
// ============================================================================

/// Fixed delay between two failed connection attempts.
pub const RECONNECT_BACKOFF_MS: u64 = 2000;

/// Status value published (retained) on every successful connection.
pub const STATUS_ONLINE: &str = "online";

// ============================================================================
// RFID
// ============================================================================

/// Window during which the same card UID is not published twice.
pub const RFID_DEDUPE_WINDOW_MS: u64 = 1500;

// ============================================================================
// Identity
// ============================================================================

/// Maximum length of a device identity token.
pub const MAX_IDENTITY_LENGTH: usize = 64;
