use bitflags::bitflags;
use hifitime::Epoch;
use log::{debug, warn};

use crate::{
    constants::{MAX_WEEK, NVS_PAYLOAD_OFFSET},
    decoder::Status,
    error::ParserError,
    nvs_packets::{ensure_len, field_gpst, FieldReader},
    options::DecoderOptions,
    state::ReceiverState,
    time::adjust_week,
};

const PACKET: &str = "88 PVT";

pub const PVT_FRAME_LEN: usize = 71;

bitflags! {
    /// Navigation solution status
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PvtFlags: u8 {
        /// Solution extrapolated from the previous fix
        const PREVIOUS_FIX = 0x80;
        const SOLUTION_2D = 0x40;
        /// Differential corrections applied
        const DIFFERENTIAL_USED = 0x10;
        const RAIM = 0x08;
        /// Differential mode enabled
        const DIFFERENTIAL = 0x04;
    }
}

/// Navigation solution
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pvt {
    pub epoch: Epoch,
    /// Latitude (rad)
    pub latitude: f64,
    /// Longitude (rad)
    pub longitude: f64,
    /// Height (m)
    pub height: f64,
    /// Velocity along latitude, longitude and height (m/s)
    pub velocity: [f64; 3],
    /// RMS position error (m)
    pub rms: f64,
    /// Receiver clock deviation
    pub deviation: f64,
    pub flags: PvtFlags,
}

/// Decodes a PVT vector (88)
pub(crate) fn decode(
    frame: &[u8],
    state: &mut ReceiverState,
    options: &DecoderOptions,
) -> Result<Status, ParserError> {
    ensure_len(PACKET, frame, PVT_FRAME_LEN)?;
    let p = FieldReader::new(&frame[NVS_PAYLOAD_OFFSET..]);

    // signed on the wire
    let week = p.i16(38);
    if !(0..MAX_WEEK as i16).contains(&week) {
        warn!("{} week error: week={}", PACKET, week);
        return Err(ParserError::InvalidWeek {
            packet: PACKET,
            week: week as u16,
        });
    }
    let week = adjust_week(week as u16, options.reference_week());
    let tow_ms = p.r10(28, options.host_order());

    let pvt = Pvt {
        epoch: field_gpst(PACKET, "time of week", week, tow_ms * 0.001)?,
        latitude: p.f64(0),
        longitude: p.f64(8),
        height: p.f64(16),
        velocity: [p.f64(40), p.f64(48), p.f64(56)],
        rms: p.f32(24),
        deviation: p.f32(64),
        flags: PvtFlags::from_bits_truncate(p.u8(68)),
    };
    debug!("{}: epoch={} flags={:?}", PACKET, pvt.epoch, pvt.flags);
    state.pvt = Some(pvt);
    Ok(Status::Pvt)
}
