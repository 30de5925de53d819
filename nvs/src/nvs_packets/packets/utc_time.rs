use log::debug;

use crate::{
    constants::NVS_PAYLOAD_OFFSET,
    decoder::Status,
    error::ParserError,
    nvs_packets::{ensure_len, FieldReader},
    state::ReceiverState,
};

const PACKET: &str = "4B time scales";

pub const UTC_FRAME_LEN: usize = 25;

/// GPS to UTC conversion parameters
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UtcParameters {
    /// Constant term (s)
    pub a0: f64,
    /// First order term (s/s)
    pub a1: f64,
    /// Reference time of week (s)
    pub tot: i32,
    /// Reference week
    pub wnt: i16,
    pub leap_seconds: i8,
}

/// Decodes the time scale parameters (4B)
pub(crate) fn decode(frame: &[u8], state: &mut ReceiverState) -> Result<Status, ParserError> {
    ensure_len(PACKET, frame, UTC_FRAME_LEN)?;
    let p = FieldReader::new(&frame[NVS_PAYLOAD_OFFSET..]);
    let utc = UtcParameters {
        a1: p.f64(0),
        a0: p.f64(8),
        tot: p.i32(16),
        wnt: p.i16(20),
        leap_seconds: p.i8(22),
    };
    debug!("{}: {:?}", PACKET, utc);
    state.navigation.utc = utc;
    Ok(Status::IonUtc)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nvs_packets::test_frame;

    #[test]
    fn utc_parameters() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&(-1.2e-14f64).to_le_bytes());
        payload.extend_from_slice(&3.7e-9f64.to_le_bytes());
        payload.extend_from_slice(&405_504i32.to_le_bytes());
        payload.extend_from_slice(&2300i16.to_le_bytes());
        payload.push(18);

        let mut state = ReceiverState::default();
        let status = decode(&test_frame(0x4B, &payload), &mut state).unwrap();
        assert_eq!(status, Status::IonUtc);
        assert_eq!(
            state.navigation.utc,
            UtcParameters {
                a0: 3.7e-9,
                a1: -1.2e-14,
                tot: 405_504,
                wnt: 2300,
                leap_seconds: 18,
            }
        );
    }

    #[test]
    fn short_frame() {
        let mut state = ReceiverState::default();
        assert!(decode(&test_frame(0x4B, &[0u8; 20]), &mut state).is_err());
        assert_eq!(state.navigation.utc, UtcParameters::default());
    }
}
