use gnss::prelude::{Constellation, SV};
use hifitime::{Duration, Epoch};
use log::{debug, warn};

use crate::{
    constants::{
        DFREQ_L1_GLO, FREQ_L1, FREQ_L1_GLO, MAX_OBSERVATIONS, MAX_WEEK, NUM_FREQUENCIES,
        NVS_PAYLOAD_OFFSET, SECONDS_PER_DAY, SPEED_OF_LIGHT,
    },
    decoder::Status,
    error::ParserError,
    nvs_packets::{ensure_len, field_gpst, FieldReader, SignalCode, SignalType},
    options::DecoderOptions,
    state::ReceiverState,
    sv::{resolve_sv, sbas_wire_prn},
    time::{adjust_week, seconds_between, to_gpst},
};

const PACKET: &str = "F5 raw measurements";

/// DLE, id, 27 bytes of header, DLE, ETX
pub const RAW_HEADER_FRAME_LEN: usize = 31;
pub const RAW_RECORD_LEN: usize = 30;
const RAW_HEADER_LEN: usize = 27;

/// Carrier phase is valid
const FLAG_PHASE_VALID: u8 = 0x08;
const DUPLICATE_EPOCH_TOLERANCE: f64 = 1e-3;
const PHASE_LIMIT: f64 = 1e10;
const PSEUDORANGE_LIMIT: f64 = 1e10;
const DOPPLER_LIMIT: f64 = 1e5;

/// Measurements of one frequency slot
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    /// Carrier phase (cycles)
    pub phase: f64,
    /// Pseudorange (m)
    pub pseudorange: f64,
    /// Doppler (Hz)
    pub doppler: f32,
    /// Signal to noise ratio (0.25 dB-Hz)
    pub snr: u8,
    /// Loss of lock indicator, set on the epoch the carrier phase becomes valid
    pub lli: bool,
    pub code: SignalCode,
}

impl Signal {
    /// Signal to noise ratio (dB-Hz)
    pub fn snr_dbhz(&self) -> f64 {
        self.snr as f64 * 0.25
    }
}

/// Measurements of one satellite at one epoch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    pub epoch: Epoch,
    pub sv: SV,
    pub signals: [Signal; NUM_FREQUENCIES],
}

impl Observation {
    fn new(epoch: Epoch, sv: SV) -> Self {
        Self {
            epoch,
            sv,
            signals: [Signal::default(); NUM_FREQUENCIES],
        }
    }
}

/// One 30-byte measurement record
struct RawRecord {
    signal_type: u8,
    prn: u8,
    glonass_channel: i8,
    snr: i8,
    phase: f64,
    pseudorange_ms: f64,
    doppler: f64,
    flags: u8,
}

impl RawRecord {
    fn parse(record: &[u8]) -> Self {
        let p = FieldReader::new(record);
        Self {
            signal_type: p.u8(0),
            prn: p.u8(1),
            glonass_channel: p.i8(2),
            snr: p.i8(3),
            phase: p.f64(4),
            pseudorange_ms: p.f64(12),
            doppler: p.f64(20),
            flags: p.u8(28),
        }
    }

    fn in_range(&self) -> bool {
        (-PHASE_LIMIT..=PHASE_LIMIT).contains(&self.phase)
            && (-PSEUDORANGE_LIMIT..=PSEUDORANGE_LIMIT).contains(&self.pseudorange_ms)
            && (-DOPPLER_LIMIT..=DOPPLER_LIMIT).contains(&self.doppler)
    }
}

/// Decodes raw measurements (F5) into the current observation set.
///
/// The receiver tags measurements with UTC, the epoch is moved to GPS time and
/// snapped to the closest 10 ms tick, the remainder being removed from the
/// pseudoranges. Epochs jumping by more than a day or repeating the previous one
/// are dropped.
pub(crate) fn decode(
    frame: &[u8],
    state: &mut ReceiverState,
    options: &DecoderOptions,
) -> Result<Status, ParserError> {
    ensure_len(PACKET, frame, RAW_HEADER_FRAME_LEN)?;
    let p = FieldReader::new(&frame[NVS_PAYLOAD_OFFSET..]);

    let utc_tow_ms = p.f64(0);
    let week = p.u16(8);
    let gps_utc_ms = p.f64(10);

    if week >= MAX_WEEK {
        warn!("{} week error: week={}", PACKET, week);
        return Err(ParserError::InvalidWeek {
            packet: PACKET,
            week,
        });
    }
    let extra = (frame.len() - RAW_HEADER_FRAME_LEN) % RAW_RECORD_LEN;
    if extra != 0 {
        warn!("{} len={} seems not be correct", PACKET, frame.len());
        return Err(ParserError::InvalidPacketLen {
            packet: PACKET,
            expect: frame.len() - extra,
            got: frame.len(),
        });
    }
    let week = adjust_week(week, options.reference_week());
    let nsat = (frame.len() - RAW_HEADER_FRAME_LEN) / RAW_RECORD_LEN;

    let gps_tow_ms = utc_tow_ms + gps_utc_ms;
    let tick_ms = 10.0 * (gps_tow_ms / 10.0 + 0.5).floor();
    let tick_remainder_ms = gps_tow_ms - tick_ms;
    let mut time = field_gpst(PACKET, "time of week", week, tick_ms * 0.001)?;

    let mut toff = 0.0;
    if let Some(tadj) = options.tadj() {
        let tn = to_gpst(time).1 / tadj;
        toff = (tn - (tn + 0.5).floor()) * tadj;
        if !toff.is_finite() {
            warn!("{} time tag adjustment error: tadj={}", PACKET, tadj);
            return Err(ParserError::InvalidField {
                packet: PACKET,
                field: "time tag adjustment",
            });
        }
        time -= Duration::from_seconds(toff);
    }

    if let Some(last) = state.last_epoch {
        let dt = seconds_between(time, last);
        if dt.abs() > SECONDS_PER_DAY {
            warn!("{} time tag jump: time={} last={}", PACKET, time, last);
            return Ok(Status::NoMessage);
        }
        if dt.abs() <= DUPLICATE_EPOCH_TOLERANCE {
            debug!("{} time tag duplicated: time={}", PACKET, time);
            return Ok(Status::NoMessage);
        }
    }

    state.observations.clear();
    let records = frame[NVS_PAYLOAD_OFFSET + RAW_HEADER_LEN..].chunks_exact(RAW_RECORD_LEN);
    for record in records.take(nsat) {
        if state.observations.len() >= MAX_OBSERVATIONS {
            break;
        }
        let record = RawRecord::parse(record);
        let Some(signal) = SignalType::from_wire(record.signal_type) else {
            warn!("{} unknown signal type {}", PACKET, record.signal_type);
            continue;
        };
        let prn = match signal.constellation {
            Constellation::SBAS => sbas_wire_prn(record.prn),
            _ => Some(record.prn),
        };
        let Some(sv) = prn.and_then(|prn| resolve_sv(signal.constellation, prn)) else {
            warn!(
                "{} satellite number error: {} prn={}",
                PACKET, signal.constellation, record.prn
            );
            continue;
        };
        if !record.in_range() {
            warn!(
                "{} obs range error: sv={} L={:e} P={:e} D={:e}",
                PACKET, sv, record.phase, record.pseudorange_ms, record.doppler
            );
            continue;
        }

        let index = match state.observations.iter().position(|obs| obs.sv == sv) {
            Some(index) => index,
            None => {
                state.observations.push(Observation::new(time, sv));
                state.observations.len() - 1
            },
        };
        let obs = &mut state.observations[index];
        let slot = &mut obs.signals[signal.slot];
        if signal.code.is_civil() && slot.code.is_precise() {
            debug!("{} {} keeps {} over {}", PACKET, sv, slot.code, signal.code);
            continue;
        }

        let carrier = match signal.constellation {
            Constellation::Glonass => FREQ_L1_GLO + DFREQ_L1_GLO * record.glonass_channel as f64,
            _ => FREQ_L1,
        };
        obs.epoch = time;
        slot.snr = (record.snr as f64 * 4.0 + 0.5) as u8;
        slot.phase = record.phase - toff * carrier;
        slot.pseudorange = (record.pseudorange_ms - tick_remainder_ms) * SPEED_OF_LIGHT * 0.001
            - toff * SPEED_OF_LIGHT;
        slot.doppler = record.doppler as f32;
        slot.code = signal.code;

        let key = (sv, signal.slot);
        let previous = state.half_cycle.get(&key).copied().unwrap_or(0);
        slot.lli = record.flags & FLAG_PHASE_VALID != 0 && previous & FLAG_PHASE_VALID == 0;
        state.half_cycle.insert(key, record.flags);
    }

    state.last_epoch = Some(time);
    debug!(
        "{}: time={} nsat={} kept={}",
        PACKET,
        time,
        nsat,
        state.observations.len()
    );
    Ok(Status::Observation)
}
