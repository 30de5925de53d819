use log::debug;

use crate::{
    constants::NVS_PAYLOAD_OFFSET,
    decoder::Status,
    error::ParserError,
    nvs_packets::{ensure_len, FieldReader},
    state::ReceiverState,
};

const PACKET: &str = "4A ionosphere";

pub const IONOSPHERE_FRAME_LEN: usize = 34;

/// Klobuchar coefficients α0..α3 then β0..β3
pub type IonosphereParameters = [f64; 8];

/// Decodes the GPS ionosphere parameters (4A)
pub(crate) fn decode(frame: &[u8], state: &mut ReceiverState) -> Result<Status, ParserError> {
    ensure_len(PACKET, frame, IONOSPHERE_FRAME_LEN)?;
    let p = FieldReader::new(&frame[NVS_PAYLOAD_OFFSET..]);
    for (i, coef) in state.navigation.ionosphere.iter_mut().enumerate() {
        *coef = p.f32(i * 4);
    }
    debug!("{}: {:?}", PACKET, state.navigation.ionosphere);
    Ok(Status::IonUtc)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nvs_packets::test_frame;

    #[test]
    fn klobuchar_coefficients() {
        let coefs: [f32; 8] = [1.5e-8, 0.0, -6.0e-8, 1.25e-7, 90112.0, 0.0, -196608.0, 65536.0];
        let payload: Vec<u8> = coefs.iter().flat_map(|c| c.to_le_bytes()).collect();
        let mut state = ReceiverState::default();
        let status = decode(&test_frame(0x4A, &payload), &mut state).unwrap();
        assert_eq!(status, Status::IonUtc);
        for (decoded, sent) in state.navigation.ionosphere.iter().zip(coefs) {
            assert_eq!(*decoded, sent as f64);
        }
    }

    #[test]
    fn short_frame() {
        let mut state = ReceiverState::default();
        let frame = test_frame(0x4A, &[0u8; 28]);
        assert!(matches!(
            decode(&frame, &mut state),
            Err(ParserError::InvalidPacketLen { expect: 34, got: 32, .. })
        ));
    }
}
