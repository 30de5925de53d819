use gnss::prelude::{Constellation, SV};
use hifitime::Epoch;
use log::{debug, warn};

use crate::{
    constants::NVS_PAYLOAD_OFFSET,
    decoder::Status,
    error::ParserError,
    extended::HostOrder,
    nvs_packets::{ensure_len, field_gpst, FieldReader},
    options::DecoderOptions,
    state::ReceiverState,
    sv::resolve_sv,
    time::adjust_week,
};

const PACKET: &str = "40 almanac";

/// Shorter frames carry no almanac
pub const ALMANAC_MIN_FRAME_LEN: usize = 42;

const SYSTEM_GPS: u8 = 1;
const SYSTEM_GLONASS: u8 = 2;

/// GPS almanac
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsAlmanac {
    pub sv: SV,
    pub health: u8,
    /// Rollover-adjusted GPS week
    pub week: u32,
    pub toa: Epoch,
    /// Time of almanac in the week (s)
    pub toas: f64,
    /// Semi-major axis (m)
    pub a: f64,
    pub e: f64,
    pub i0: f64,
    pub omega0: f64,
    pub omega: f64,
    pub omega_dot: f64,
    pub m0: f64,
    pub af0: f64,
    pub af1: f64,
}

/// GLONASS almanac
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlonassAlmanac {
    pub sv: SV,
    pub health: u8,
    /// Frequency channel number
    pub hn: u8,
    /// Clock bias (s)
    pub tau: f64,
    /// Longitude of the first ascending node
    pub lambda: f64,
    /// Inclination correction
    pub delta_i: f64,
    pub eps: f64,
    pub omega: f64,
    /// Time of the first ascending node (s)
    pub t_lambda: f64,
    /// Draconian period correction (s)
    pub delta_t: f64,
    /// Draconian period rate (s/orbit)
    pub delta_t_dot: f64,
    /// Day number within the four year period
    pub na: u16,
}

/// Decodes an almanac (40).
///
/// The week and day number words are located according to the byte order the
/// extended float time tag is loaded with.
pub(crate) fn decode(
    frame: &[u8],
    state: &mut ReceiverState,
    options: &DecoderOptions,
) -> Result<Status, ParserError> {
    if frame.len() < ALMANAC_MIN_FRAME_LEN {
        debug!("{} too short: len={}", PACKET, frame.len());
        return Ok(Status::NoMessage);
    }
    let p = FieldReader::new(&frame[NVS_PAYLOAD_OFFSET..]);
    match p.u8(0) {
        SYSTEM_GPS => decode_gps(frame, p, state, options),
        SYSTEM_GLONASS if options.glonass_almanac => decode_glonass(frame, p, state, options),
        system => {
            debug!("{} system {} skipped", PACKET, system);
            Ok(Status::NoMessage)
        },
    }
}

fn resolve(constellation: Constellation, prn: u8) -> Result<SV, ParserError> {
    resolve_sv(constellation, prn).ok_or_else(|| {
        warn!("{} satellite number error: {} prn={}", PACKET, constellation, prn);
        ParserError::UnknownSatellite {
            packet: PACKET,
            prn,
        }
    })
}

fn decode_gps(
    frame: &[u8],
    p: FieldReader<'_>,
    state: &mut ReceiverState,
    options: &DecoderOptions,
) -> Result<Status, ParserError> {
    let order = options.host_order();
    let week_offset = match order {
        HostOrder::Little => 58,
        HostOrder::Big => 72,
    };
    ensure_len(PACKET, frame, NVS_PAYLOAD_OFFSET + week_offset + 2)?;
    let sv = resolve(Constellation::GPS, p.u8(1))?;

    let week = adjust_week(p.host_u16(week_offset, order), options.reference_week());
    let toa_ms = p.r10(48, order);
    let alm = GpsAlmanac {
        sv,
        health: p.u8(2),
        week,
        toa: field_gpst(PACKET, "toa", week, toa_ms * 0.001)?,
        toas: toa_ms * 0.001,
        a: p.f64(16),
        e: p.f32(4),
        i0: p.f32(8),
        omega0: p.f32(24),
        omega: p.f32(28),
        omega_dot: p.f32(12),
        m0: p.f32(32),
        af0: p.f32(36),
        af1: p.f32(40),
    };
    debug!("{}: {} week={} toas={}", PACKET, sv, alm.week, alm.toas);
    state.navigation.gps_almanacs.insert(sv, alm);
    Ok(Status::Almanac)
}

fn decode_glonass(
    frame: &[u8],
    p: FieldReader<'_>,
    state: &mut ReceiverState,
    options: &DecoderOptions,
) -> Result<Status, ParserError> {
    let na_offset = match options.host_order() {
        HostOrder::Little => 40,
        HostOrder::Big => 54,
    };
    ensure_len(PACKET, frame, NVS_PAYLOAD_OFFSET + na_offset + 2)?;
    let sv = resolve(Constellation::Glonass, p.u8(1))?;

    let alm = GlonassAlmanac {
        sv,
        health: p.u8(2),
        hn: p.u8(3),
        tau: p.f32(4),
        lambda: p.f32(8),
        delta_i: p.f32(12),
        eps: p.f32(16),
        omega: p.f32(20),
        t_lambda: p.f32(24),
        delta_t: p.f64(28),
        delta_t_dot: p.f32(36),
        na: p.host_u16(na_offset, options.host_order()),
    };
    debug!("{}: {} na={}", PACKET, sv, alm.na);
    state.navigation.glonass_almanacs.insert(sv, alm);
    Ok(Status::Almanac)
}
