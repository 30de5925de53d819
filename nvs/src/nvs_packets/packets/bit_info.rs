use log::{debug, trace, warn};

use crate::{
    constants::NVS_PAYLOAD_OFFSET,
    decoder::Status,
    error::ParserError,
    nvs_packets::{ensure_len, FieldReader},
    sbas::SbasDecoder,
    state::ReceiverState,
};

const PACKET: &str = "E5 bit information";

pub const MAX_DATA_BLOCKS: u8 = 16;

const BLOCK_GLONASS: u8 = 1;
const BLOCK_GPS: u8 = 2;
const BLOCK_SBAS: u8 = 4;
const GLONASS_BLOCK_LEN: usize = 19;
const GPS_BLOCK_LEN: usize = 47;
const SBAS_WORDS_OFFSET: usize = 7;
const SBAS_PRN_BASE: u16 = 120;

/// Walks the data blocks of a bit information message (E5).
///
/// GPS and GLONASS subframes are skipped. The first SBAS block is handed to the
/// SBAS decoder and ends the walk.
pub(crate) fn decode<S: SbasDecoder>(
    frame: &[u8],
    state: &mut ReceiverState,
    sbas: &mut S,
) -> Result<Status, ParserError> {
    ensure_len(PACKET, frame, NVS_PAYLOAD_OFFSET + 1)?;
    let p = FieldReader::new(&frame[NVS_PAYLOAD_OFFSET..]);
    let blocks = p.u8(0);
    if blocks >= MAX_DATA_BLOCKS {
        warn!("{} data blocks {}", PACKET, blocks);
        return Err(ParserError::InvalidField {
            packet: PACKET,
            field: "data blocks",
        });
    }

    let mut idx = 1;
    for _ in 0..blocks {
        ensure_len(PACKET, frame, idx + 10)?;
        match p.u8(idx + 1) {
            BLOCK_GLONASS => idx += GLONASS_BLOCK_LEN,
            BLOCK_GPS => idx += GPS_BLOCK_LEN,
            BLOCK_SBAS => {
                let prn = p.u8(idx + 2) as u16 + SBAS_PRN_BASE;
                let start = idx + SBAS_WORDS_OFFSET;
                ensure_len(PACKET, frame, NVS_PAYLOAD_OFFSET + start + 40)?;

                let mut words = [0u32; 10];
                for (i, word) in words.iter_mut().enumerate() {
                    *word = p.u32(start + i * 4);
                }
                words[7] >>= 6;

                return match sbas.decode(state.last_epoch, prn, &words) {
                    Some(msg) => {
                        debug!("{}: sbas prn={} type={}", PACKET, prn, msg.message_type());
                        state.sbas = Some(msg);
                        Ok(Status::Sbas)
                    },
                    None => {
                        trace!("{}: sbas prn={} not decoded", PACKET, prn);
                        Ok(Status::NoMessage)
                    },
                };
            },
            other => {
                warn!("{} unknown block type {}", PACKET, other);
                return Err(ParserError::InvalidField {
                    packet: PACKET,
                    field: "block type",
                });
            },
        }
    }
    Ok(Status::NoMessage)
}
