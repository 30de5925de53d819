use hifitime::Epoch;

use crate::time::to_gpst;

/// Message transmission time added to the receive time of week
const SBAS_TRANSMISSION_TIME: f64 = 1.0;
const CRC24Q_POLY: u32 = 0x0186_4CFB;

/// Raw SBAS message: 226 data bits (preamble, type and payload) packed
/// from the most significant bit, parity stripped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SbasMessage {
    pub week: u32,
    pub tow: u32,
    pub prn: u16,
    pub msg: [u8; 29],
}

impl SbasMessage {
    /// Message type identifier, bits 8..14
    pub fn message_type(&self) -> u8 {
        self.msg[1] >> 2
    }
}

/// Interprets the ten words of an SBAS sub-block.
///
/// `words[7]` already has its 6 padding bits shifted out, so that its low 24 bits
/// hold the parity and bits 24..26 the last two data bits.
pub trait SbasDecoder {
    fn decode(&mut self, epoch: Option<Epoch>, prn: u16, words: &[u32; 10]) -> Option<SbasMessage>;
}

/// Implement decoder for simple callbacks / closures
impl<F> SbasDecoder for F
where
    F: FnMut(Option<Epoch>, u16, &[u32; 10]) -> Option<SbasMessage>,
{
    fn decode(&mut self, epoch: Option<Epoch>, prn: u16, words: &[u32; 10]) -> Option<SbasMessage> {
        self(epoch, prn, words)
    }
}

/// Packs the words into an [SbasMessage] and accepts it when its CRC-24Q matches
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc24qSbasDecoder;

impl SbasDecoder for Crc24qSbasDecoder {
    fn decode(&mut self, epoch: Option<Epoch>, prn: u16, words: &[u32; 10]) -> Option<SbasMessage> {
        let epoch = epoch?;
        let (week, tow) = to_gpst(epoch);

        let mut msg = [0u8; 29];
        for (i, word) in words[..7].iter().enumerate() {
            msg[i * 4..i * 4 + 4].copy_from_slice(&word.to_be_bytes());
        }
        msg[28] = ((words[7] >> 18) & 0xC0) as u8;

        // realign the 226 data bits on a byte boundary
        let mut aligned = [0u8; 29];
        for i in (1..29).rev() {
            aligned[i] = (msg[i] >> 6) | (msg[i - 1] << 2);
        }
        aligned[0] = msg[0] >> 6;

        if crc24q(&aligned) != words[7] & 0x00FF_FFFF {
            return None;
        }
        Some(SbasMessage {
            week,
            tow: (tow + SBAS_TRANSMISSION_TIME) as u32,
            prn,
            msg,
        })
    }
}

/// CRC-24Q as used by SBAS and RTCM3
pub fn crc24q(data: &[u8]) -> u32 {
    let mut crc = 0u32;
    for &byte in data {
        crc ^= (byte as u32) << 16;
        for _ in 0..8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= CRC24Q_POLY;
            }
        }
    }
    crc & 0x00FF_FFFF
}
