pub mod packets;
pub mod types;

pub use packets::*;
pub use types::*;

use hifitime::Epoch;
use log::warn;

use crate::{
    constants::{NVS_END_CHAR, NVS_SYNC_CHAR},
    error::ParserError,
    extended::{decode_r10, HostOrder},
    parser::stuff_bytes,
    time::gpst,
};

/// Identifiers of the BINR messages understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageType {
    /// F5: raw measurements
    RawObservation = 0xF5,
    /// F7: GPS or GLONASS ephemeris
    Ephemeris = 0xF7,
    /// E5: bit information, carries SBAS messages
    BitInformation = 0xE5,
    /// 4A: ionosphere parameters
    Ionosphere = 0x4A,
    /// 4B: GPS, GLONASS and UTC time scale parameters
    TimeScale = 0x4B,
    /// 88: PVT vector
    Pvt = 0x88,
    /// 40: almanac
    Almanac = 0x40,
}

impl MessageType {
    pub fn from_u8(id: u8) -> Option<Self> {
        match id {
            0xF5 => Some(Self::RawObservation),
            0xF7 => Some(Self::Ephemeris),
            0xE5 => Some(Self::BitInformation),
            0x4A => Some(Self::Ionosphere),
            0x4B => Some(Self::TimeScale),
            0x88 => Some(Self::Pvt),
            0x40 => Some(Self::Almanac),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Builds a frame for a message: `DLE id payload DLE ETX`, the payload being DLE stuffed
pub fn encode_frame(msg_id: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.push(NVS_SYNC_CHAR);
    out.push(msg_id);
    stuff_bytes(payload, &mut out);
    out.push(NVS_SYNC_CHAR);
    out.push(NVS_END_CHAR);
    out
}

/// Frame as handed to the decoders, without DLE stuffing
#[cfg(test)]
pub(crate) fn test_frame(msg_id: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![NVS_SYNC_CHAR, msg_id];
    out.extend_from_slice(payload);
    out.extend_from_slice(&[NVS_SYNC_CHAR, NVS_END_CHAR]);
    out
}

/// Fails with [ParserError::InvalidPacketLen] unless `frame` holds at least `expect` bytes
pub(crate) fn ensure_len(
    packet: &'static str,
    frame: &[u8],
    expect: usize,
) -> Result<(), ParserError> {
    if frame.len() < expect {
        Err(ParserError::InvalidPacketLen {
            packet,
            expect,
            got: frame.len(),
        })
    } else {
        Ok(())
    }
}

/// GPS time of a week and time of week field, failing with [ParserError::InvalidField]
/// when the field is not a finite number
pub(crate) fn field_gpst(
    packet: &'static str,
    field: &'static str,
    week: u32,
    tow: f64,
) -> Result<Epoch, ParserError> {
    gpst(week, tow).ok_or_else(|| {
        warn!("{} {} is not finite: {}", packet, field, tow);
        ParserError::InvalidField { packet, field }
    })
}

/// Little endian field accessors over a message body.
///
/// Offsets are relative to the first byte after the message id. Callers check
/// the frame length before reading.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn array<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[offset..offset + N]);
        out
    }

    pub(crate) fn u8(&self, offset: usize) -> u8 {
        self.buf[offset]
    }

    pub(crate) fn i8(&self, offset: usize) -> i8 {
        self.buf[offset] as i8
    }

    pub(crate) fn u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes(self.array(offset))
    }

    pub(crate) fn i16(&self, offset: usize) -> i16 {
        i16::from_le_bytes(self.array(offset))
    }

    pub(crate) fn u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes(self.array(offset))
    }

    pub(crate) fn i32(&self, offset: usize) -> i32 {
        i32::from_le_bytes(self.array(offset))
    }

    pub(crate) fn f32(&self, offset: usize) -> f64 {
        f32::from_le_bytes(self.array(offset)) as f64
    }

    pub(crate) fn f64(&self, offset: usize) -> f64 {
        f64::from_le_bytes(self.array(offset))
    }

    /// 16-bit word loaded with the host byte order
    pub(crate) fn host_u16(&self, offset: usize, order: HostOrder) -> u16 {
        order.read_u16(self.array(offset))
    }

    /// 80-bit extended float
    pub(crate) fn r10(&self, offset: usize, order: HostOrder) -> f64 {
        decode_r10(self.array(offset), order)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn message_ids() {
        for id in [0xF5, 0xF7, 0xE5, 0x4A, 0x4B, 0x88, 0x40] {
            assert_eq!(MessageType::from_u8(id).map(MessageType::id), Some(id));
        }
        assert_eq!(MessageType::from_u8(0x60), None);
    }

    #[test]
    fn frame_encoding() {
        assert_eq!(
            encode_frame(0x4A, &[0x10, 0x03]),
            vec![0x10, 0x4A, 0x10, 0x10, 0x03, 0x10, 0x03]
        );
    }

    #[test]
    fn field_reader() {
        let bytes = [0xFF, 0x34, 0x12, 0x00, 0x00, 0x80, 0x3F];
        let p = FieldReader::new(&bytes);
        assert_eq!(p.i8(0), -1);
        assert_eq!(p.u16(1), 0x1234);
        assert_eq!(p.i16(1), 0x1234);
        assert_eq!(p.f32(3), 1.0);
        assert_eq!(p.host_u16(1, HostOrder::Big), 0x3412);
        assert!(ensure_len("test", &bytes, 8).is_err());
        assert!(ensure_len("test", &bytes, 7).is_ok());
    }
}
