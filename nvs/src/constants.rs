pub const NVS_SYNC_CHAR: u8 = 0x10; // DLE
pub const NVS_END_CHAR: u8 = 0x03; // ETX

/// Largest frame kept in the accumulation buffer, terminator included
pub const MAX_FRAME_LEN: usize = 4096;

/// File mode gives up on a sync search or a frame body after this many bytes
pub(crate) const FILE_SCAN_LIMIT: usize = 4096;

pub(crate) const NVS_TYPE_OFFSET: usize = 1;
pub(crate) const NVS_PAYLOAD_OFFSET: usize = 2; // After DLE, TYPE

/// Most satellites kept in one observation epoch
pub const MAX_OBSERVATIONS: usize = 96;

/// Frequency slots per satellite
pub const NUM_FREQUENCIES: usize = 3;

pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
pub(crate) const FREQ_L1: f64 = 1.575_42e9;
pub(crate) const FREQ_L1_GLO: f64 = 1.602e9;
pub(crate) const DFREQ_L1_GLO: f64 = 0.5625e6;

/// GPS week values at or above this are considered corrupted
pub const MAX_WEEK: u16 = 4096;
pub(crate) const WEEK_ROLLOVER: i64 = 1024;
pub(crate) const MIN_REFERENCE_WEEK: u32 = 1560;
pub(crate) const SECONDS_PER_DAY: f64 = 86_400.0;
pub(crate) const HALF_DAY: f64 = 43_200.0;
pub(crate) const GLONASS_TIME_OFFSET: f64 = 10_800.0; // UTC(SU) = UTC + 3h

pub(crate) const SBAS_PRN_OFFSET: u8 = 120;
