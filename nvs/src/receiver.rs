use std::io::Read;

use crate::{
    decoder::{Decoder, Status},
    error::ParserError,
    options::DecoderOptions,
    parser::{FileFrame, FrameSync},
    sbas::{Crc24qSbasDecoder, SbasDecoder},
    state::ReceiverState,
};

/// A decoding session: frame synchronization followed by message decoding.
///
/// ```
/// use nvs::{DecoderOptions, Receiver, Status};
///
/// let mut receiver = Receiver::new(DecoderOptions::default());
/// // ionosphere parameters, all zero
/// let mut frame = vec![0x10, 0x4A];
/// frame.extend_from_slice(&[0u8; 32]);
/// frame.extend_from_slice(&[0x10, 0x03]);
///
/// let statuses: Vec<Status> = receiver.consume(&frame).filter_map(Result::ok).collect();
/// assert_eq!(statuses, vec![Status::IonUtc]);
/// ```
#[derive(Debug, Default)]
pub struct Receiver<S = Crc24qSbasDecoder> {
    sync: FrameSync,
    decoder: Decoder<S>,
}

impl Receiver<Crc24qSbasDecoder> {
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            sync: FrameSync::new(),
            decoder: Decoder::new(options),
        }
    }
}

impl<S: SbasDecoder> Receiver<S> {
    pub fn with_sbas_decoder(options: DecoderOptions, sbas: S) -> Self {
        Self {
            sync: FrameSync::new(),
            decoder: Decoder::with_sbas_decoder(options, sbas),
        }
    }

    pub fn decoder(&self) -> &Decoder<S> {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut Decoder<S> {
        &mut self.decoder
    }

    pub fn state(&self) -> &ReceiverState {
        self.decoder.state()
    }

    pub fn options(&self) -> &DecoderOptions {
        self.decoder.options()
    }

    /// Drops the frame in progress and everything decoded so far
    pub fn reset(&mut self) {
        self.sync.reset();
        self.decoder.reset();
    }

    /// Feeds one byte from a stream, decoding the frame it completes if any
    pub fn input(&mut self, byte: u8) -> Result<Status, ParserError> {
        match self.sync.push(byte) {
            None => Ok(Status::NoMessage),
            Some(Err(e)) => Err(e),
            Some(Ok(_)) => self.decoder.decode(self.sync.frame()),
        }
    }

    /// Reads the next frame from `reader` and decodes it.
    ///
    /// Returns [Status::EndOfInput] once the reader is exhausted, and
    /// [Status::NoMessage] when no frame was found within the scan limit.
    pub fn input_file<R: Read>(&mut self, reader: &mut R) -> Result<Status, ParserError> {
        match self.sync.read_frame(reader)? {
            FileFrame::Complete(_) => self.decoder.decode(self.sync.frame()),
            FileFrame::NoMessage => Ok(Status::NoMessage),
            FileFrame::EndOfInput => Ok(Status::EndOfInput),
        }
    }

    /// Feeds a chunk of a stream, yielding the outcome of every frame it completes
    pub fn consume<'a>(&'a mut self, data: &'a [u8]) -> ReceiverIter<'a, S> {
        ReceiverIter {
            receiver: self,
            data: data.iter(),
        }
    }
}

/// Decoding outcomes of the frames completed by a chunk, see [Receiver::consume]
pub struct ReceiverIter<'a, S> {
    receiver: &'a mut Receiver<S>,
    data: core::slice::Iter<'a, u8>,
}

impl<S: SbasDecoder> ReceiverIter<'_, S> {
    /// Session state as left by the frame last yielded
    pub fn state(&self) -> &ReceiverState {
        self.receiver.state()
    }
}

impl<S: SbasDecoder> Iterator for ReceiverIter<'_, S> {
    type Item = Result<Status, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        for &byte in self.data.by_ref() {
            let receiver = &mut *self.receiver;
            match receiver.sync.push(byte) {
                None => {},
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(_)) => return Some(receiver.decoder.decode(receiver.sync.frame())),
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::nvs_packets::encode_frame;

    fn utc_frame() -> Vec<u8> {
        let mut payload = vec![0u8; 23];
        // leap seconds
        payload[22] = 0x10;
        encode_frame(0x4B, &payload)
    }

    #[test]
    fn byte_by_byte() {
        let mut receiver = Receiver::new(DecoderOptions::default());
        let frame = utc_frame();
        let (last, head) = frame.split_last().unwrap();
        for &byte in head {
            assert_eq!(receiver.input(byte).unwrap(), Status::NoMessage);
        }
        assert_eq!(receiver.input(*last).unwrap(), Status::IonUtc);
        assert_eq!(receiver.state().navigation().utc.leap_seconds, 16);
    }

    #[test]
    fn file_input() {
        let mut data = vec![0xAA, 0x55];
        data.extend(utc_frame());
        data.extend(encode_frame(0x60, &[1, 2]));
        let mut reader = Cursor::new(data);

        let mut receiver = Receiver::new(DecoderOptions::default());
        assert_eq!(receiver.input_file(&mut reader).unwrap(), Status::IonUtc);
        assert_eq!(receiver.input_file(&mut reader).unwrap(), Status::NoMessage);
        assert_eq!(receiver.input_file(&mut reader).unwrap(), Status::EndOfInput);
    }

    #[test]
    fn chunk_iterator() {
        let mut data = utc_frame();
        data.extend(encode_frame(0x4A, &[0u8; 4]));
        data.extend(utc_frame());

        let mut receiver = Receiver::new(DecoderOptions::default());
        let codes: Vec<i32> = receiver
            .consume(&data)
            .map(|res| res.map_or_else(|e| e.code(), Status::code))
            .collect();
        assert_eq!(codes, vec![9, -1, 9]);
    }

    #[test]
    fn state_follows_each_frame() {
        let mut data = utc_frame();
        let mut payload = vec![0u8; 23];
        payload[22] = 18;
        data.extend(encode_frame(0x4B, &payload));

        let mut receiver = Receiver::new(DecoderOptions::default());
        let mut it = receiver.consume(&data);
        let mut leap_seconds = Vec::new();
        while let Some(result) = it.next() {
            assert_eq!(result.unwrap(), Status::IonUtc);
            leap_seconds.push(it.state().navigation().utc.leap_seconds);
        }
        assert_eq!(leap_seconds, vec![16, 18]);
    }
}
