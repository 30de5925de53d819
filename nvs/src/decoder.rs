use core::fmt;

use log::debug;

use crate::{
    constants::NVS_TYPE_OFFSET,
    error::ParserError,
    nvs_packets::{
        almanac, bit_info, ephemeris, ionosphere, pvt, raw_obs, utc_time, MessageType,
    },
    options::DecoderOptions,
    sbas::{Crc24qSbasDecoder, SbasDecoder},
    state::ReceiverState,
};

/// What a decoded frame produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// Nothing new: incomplete frame, ignored message or rejected content
    NoMessage,
    Observation,
    Ephemeris,
    Sbas,
    Pvt,
    Almanac,
    /// Ionosphere or UTC parameters
    IonUtc,
    /// The reader is exhausted
    EndOfInput,
}

impl Status {
    /// Numeric status, errors being reported as -1 by [ParserError::code]
    pub fn code(self) -> i32 {
        match self {
            Status::NoMessage => 0,
            Status::Observation => 1,
            Status::Ephemeris => 2,
            Status::Sbas => 3,
            Status::Pvt => 4,
            Status::Almanac => 6,
            Status::IonUtc => 9,
            Status::EndOfInput => -2,
        }
    }
}

/// Message type and length of a frame, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageTag {
    pub msg_type: u8,
    pub len: usize,
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NVS: type={:2} len={:3}", self.msg_type, self.len)
    }
}

/// Decodes complete frames into the receiver state.
///
/// Frames are expected as produced by [FrameSync](crate::FrameSync): leading DLE and
/// message id, unstuffed payload, trailing DLE ETX.
#[derive(Debug, Default)]
pub struct Decoder<S = Crc24qSbasDecoder> {
    options: DecoderOptions,
    sbas: S,
    state: ReceiverState,
}

impl Decoder<Crc24qSbasDecoder> {
    pub fn new(options: DecoderOptions) -> Self {
        Self::with_sbas_decoder(options, Crc24qSbasDecoder)
    }
}

impl<S: SbasDecoder> Decoder<S> {
    /// Decoder handing SBAS blocks to a custom SBAS decoder
    pub fn with_sbas_decoder(options: DecoderOptions, sbas: S) -> Self {
        Self {
            options,
            sbas,
            state: ReceiverState::default(),
        }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: DecoderOptions) {
        self.options = options;
    }

    pub fn state(&self) -> &ReceiverState {
        &self.state
    }

    /// Forgets everything decoded so far
    pub fn reset(&mut self) {
        self.state = ReceiverState::default();
    }

    /// Decodes one frame.
    ///
    /// Errors only concern this frame, the state is left untouched and decoding
    /// can go on with the next one.
    pub fn decode(&mut self, frame: &[u8]) -> Result<Status, ParserError> {
        let Some(&msg_type) = frame.get(NVS_TYPE_OFFSET) else {
            return Ok(Status::NoMessage);
        };
        let tag = MessageTag {
            msg_type,
            len: frame.len(),
        };
        debug!("{}", tag);
        self.state.last_tag = Some(tag);

        let state = &mut self.state;
        let options = &self.options;
        match MessageType::from_u8(msg_type) {
            Some(MessageType::RawObservation) => raw_obs::decode(frame, state, options),
            Some(MessageType::Ephemeris) => ephemeris::decode(frame, state, options),
            Some(MessageType::BitInformation) => bit_info::decode(frame, state, &mut self.sbas),
            Some(MessageType::Ionosphere) => ionosphere::decode(frame, state),
            Some(MessageType::TimeScale) => utc_time::decode(frame, state),
            Some(MessageType::Pvt) => pvt::decode(frame, state, options),
            Some(MessageType::Almanac) => almanac::decode(frame, state, options),
            None => Ok(Status::NoMessage),
        }
    }
}
