//! Control surface configuration constants and limits.

/// Measured hall width in meters.
pub const HALL_WIDTH_M: f64 = 15.1;

/// Measured hall depth in meters.
pub const HALL_HEIGHT_M: f64 = 19.4;

/// Margin around the hall drawing, as a fraction of the viewport width.
pub const MARGIN_RATIO: f64 = 0.05;

/// Bottom band of the floor-plan viewport that starts a paging swipe.
pub const PAGING_BAND_RATIO: f64 = 0.10;

/// Net horizontal displacement a paging swipe must exceed, in pixels.
pub const SWIPE_THRESHOLD_PX: f64 = 50.0;

/// Movement below this distance from the touch origin is treated as a tap.
pub const TAP_SLOP_PX: f64 = 8.0;

/// Hit radius around a speaker's screen-space center (speaker icons are 50×50).
pub const SPEAKER_HIT_RADIUS_PX: f64 = 25.0;

/// Minimum time between two source position updates, in milliseconds.
pub const SOURCE_INTERVAL_MS: u64 = 50;

/// Minimum per-axis change of the source position before it is re-sent, in meters.
pub const SOURCE_MIN_DELTA_M: f64 = 0.1;

/// Minimum time between two fader updates on one channel, in milliseconds.
pub const FADER_INTERVAL_MS: u64 = 50;

/// Maximum fader value accepted by the mixer.
pub const FADER_MAX: u16 = 1023;

/// Capacity of the outbound message ring.
pub const OUTBOUND_CAPACITY: usize = 1024;

/// Default floor-plan viewport used until the host reports its real size.
pub const DEFAULT_VIEWPORT_WIDTH_PX: f64 = 1024.0;

/// Default floor-plan viewport height (80% of a 1024×1366 tablet in portrait).
pub const DEFAULT_VIEWPORT_HEIGHT_PX: f64 = 1092.8;
