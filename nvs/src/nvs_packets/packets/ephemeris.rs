use gnss::prelude::{Constellation, SV};
use hifitime::Epoch;
use log::{debug, warn};

use crate::{
    constants::{GLONASS_TIME_OFFSET, MAX_WEEK, NVS_PAYLOAD_OFFSET},
    decoder::Status,
    error::ParserError,
    nvs_packets::{ensure_len, field_gpst, FieldReader},
    options::DecoderOptions,
    state::ReceiverState,
    sv::resolve_sv,
    time::{adjust_day, adjust_week},
};

const PACKET: &str = "F7 ephemeris";

pub const EPHEMERIS_MIN_FRAME_LEN: usize = 93;
pub const GPS_EPHEMERIS_FRAME_LEN: usize = 140;
pub const GLONASS_EPHEMERIS_FRAME_LEN: usize = 95;

const SYSTEM_GPS: u8 = 1;
const SYSTEM_GLONASS: u8 = 2;

/// User range accuracy upper bounds (m) of each URA index
const URA_BOUNDS: [f64; 15] = [
    2.4, 3.4, 4.85, 6.85, 9.65, 13.65, 24.0, 48.0, 96.0, 192.0, 384.0, 768.0, 1536.0, 3072.0,
    6144.0,
];

/// URA index of an accuracy in meters, 15 when beyond the table
pub fn ura_index(value: f64) -> u8 {
    URA_BOUNDS
        .iter()
        .position(|bound| *bound >= value)
        .unwrap_or(URA_BOUNDS.len()) as u8
}

/// GPS broadcast ephemeris
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsEphemeris {
    pub sv: SV,
    pub iode: i32,
    pub iodc: i32,
    /// URA index
    pub sva: u8,
    /// Code on L2
    pub code: i32,
    /// L2 P data flag
    pub flag: i32,
    /// Rollover-adjusted GPS week
    pub week: u32,
    pub toe: Epoch,
    pub toc: Epoch,
    /// Transmission time, the epoch of the last raw measurements
    pub ttr: Epoch,
    /// Semi-major axis (m)
    pub a: f64,
    pub e: f64,
    pub i0: f64,
    pub omega0: f64,
    pub omega: f64,
    pub m0: f64,
    pub delta_n: f64,
    pub omega_dot: f64,
    pub idot: f64,
    pub crc: f64,
    pub crs: f64,
    pub cuc: f64,
    pub cus: f64,
    pub cic: f64,
    pub cis: f64,
    /// Time of ephemeris in the week (s)
    pub toes: f64,
    /// Fit interval (h)
    pub fit: f64,
    pub af0: f64,
    pub af1: f64,
    pub af2: f64,
    pub tgd: f64,
}

/// GLONASS broadcast ephemeris, in PZ-90 coordinates
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlonassEphemeris {
    pub sv: SV,
    /// Frequency channel number
    pub channel: i8,
    /// `(tb / 900) & 0x7F`
    pub iode: i32,
    pub age: i32,
    pub toe: Epoch,
    pub tof: Epoch,
    /// Position (m)
    pub pos: [f64; 3],
    /// Velocity (m/s)
    pub vel: [f64; 3],
    /// Acceleration (m/s²)
    pub acc: [f64; 3],
    /// Relative frequency bias
    pub gamma: f64,
    /// Clock bias (s)
    pub tau: f64,
}

/// Decodes an ephemeris (F7), GPS or GLONASS depending on its first byte
pub(crate) fn decode(
    frame: &[u8],
    state: &mut ReceiverState,
    options: &DecoderOptions,
) -> Result<Status, ParserError> {
    ensure_len(PACKET, frame, EPHEMERIS_MIN_FRAME_LEN)?;
    let p = FieldReader::new(&frame[NVS_PAYLOAD_OFFSET..]);
    let constellation = match p.u8(0) {
        SYSTEM_GPS => Constellation::GPS,
        SYSTEM_GLONASS => Constellation::Glonass,
        system => {
            debug!("{} unsupported system {}", PACKET, system);
            return Ok(Status::NoMessage);
        },
    };
    let prn = p.u8(1);
    let sv = resolve_sv(constellation, prn).ok_or_else(|| {
        warn!("{} satellite number error: prn={}", PACKET, prn);
        ParserError::UnknownSatellite {
            packet: PACKET,
            prn,
        }
    })?;

    match constellation {
        Constellation::GPS => decode_gps(frame, sv, state, options),
        _ => decode_glonass(frame, sv, state),
    }
}

fn decode_gps(
    frame: &[u8],
    sv: SV,
    state: &mut ReceiverState,
    options: &DecoderOptions,
) -> Result<Status, ParserError> {
    ensure_len(PACKET, frame, GPS_EPHEMERIS_FRAME_LEN)?;
    let p = FieldReader::new(&frame[NVS_PAYLOAD_OFFSET..]);

    let week = p.u16(136);
    if week >= MAX_WEEK {
        warn!("{} gps week error: sv={} week={}", PACKET, sv, week);
        return Err(ParserError::InvalidWeek {
            packet: PACKET,
            week,
        });
    }
    let Some(ttr) = state.last_epoch else {
        debug!("{} {} before the first epoch", PACKET, sv);
        return Ok(Status::NoMessage);
    };
    let week = adjust_week(week, options.reference_week());
    let toes = p.f64(42) * 1e-3;

    let eph = GpsEphemeris {
        sv,
        iode: p.i16(128) as i32,
        iodc: p.i16(130) as i32,
        sva: ura_index(p.i16(126) as f64),
        code: p.i16(132) as i32,
        flag: p.i16(134) as i32,
        week,
        toe: field_gpst(PACKET, "toe", week, toes)?,
        toc: field_gpst(PACKET, "toc", week, p.f64(106) * 1e-3)?,
        ttr,
        a: p.f64(34).powi(2),
        e: p.f64(22),
        i0: p.f64(66),
        omega0: p.f64(54),
        omega: p.f64(78),
        m0: p.f64(10),
        delta_n: p.f32(6) * 1e3,
        omega_dot: p.f64(86) * 1e3,
        idot: p.f64(94) * 1e3,
        crc: p.f32(74),
        crs: p.f32(2),
        cuc: p.f32(18),
        cus: p.f32(30),
        cic: p.f32(50),
        cis: p.f32(62),
        toes,
        fit: 0.0,
        af0: p.f32(122) * 1e-3,
        af1: p.f32(118),
        af2: p.f32(114) * 1e3,
        tgd: p.f32(102) * 1e-3,
    };

    if !options.accept_all_ephemerides {
        if let Some(stored) = state.navigation.gps_ephemerides.get(&sv) {
            if stored.iode == eph.iode {
                debug!("{} {} unchanged iode={}", PACKET, sv, eph.iode);
                return Ok(Status::NoMessage);
            }
        }
    }
    debug!("{}: {} iode={} toe={}", PACKET, sv, eph.iode, eph.toe);
    state.navigation.gps_ephemerides.insert(sv, eph);
    state.last_ephemeris = Some(sv);
    Ok(Status::Ephemeris)
}

fn decode_glonass(frame: &[u8], sv: SV, state: &mut ReceiverState) -> Result<Status, ParserError> {
    ensure_len(PACKET, frame, GLONASS_EPHEMERIS_FRAME_LEN)?;
    let p = FieldReader::new(&frame[NVS_PAYLOAD_OFFSET..]);

    let Some(last) = state.last_epoch else {
        debug!("{} {} before the first epoch", PACKET, sv);
        return Ok(Status::NoMessage);
    };
    let tb = (p.f64(75) * 1e-3) as i32;
    let toe =
        adjust_day(last, tb as f64 - GLONASS_TIME_OFFSET).ok_or(ParserError::InvalidField {
            packet: PACKET,
            field: "tb",
        })?;

    let geph = GlonassEphemeris {
        sv,
        channel: p.i8(2),
        iode: (tb / 900) & 0x7F,
        age: p.i16(91) as i32,
        toe,
        tof: toe,
        pos: [p.f64(3), p.f64(11), p.f64(19)],
        vel: [p.f64(27) * 1e3, p.f64(35) * 1e3, p.f64(43) * 1e3],
        acc: [p.f64(51) * 1e6, p.f64(59) * 1e6, p.f64(67) * 1e6],
        gamma: p.f32(83),
        tau: p.f32(87) * 1e-3,
    };
    debug!("{}: {} iode={} toe={}", PACKET, sv, geph.iode, geph.toe);
    state.navigation.glonass_ephemerides.insert(sv, geph);
    state.last_ephemeris = Some(sv);
    Ok(Status::Ephemeris)
}
