use std::io::{ErrorKind, Read};

use log::{trace, warn};

use crate::{
    constants::{FILE_SCAN_LIMIT, MAX_FRAME_LEN, NVS_END_CHAR, NVS_SYNC_CHAR},
    error::ParserError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    /// Waiting for a DLE
    Idle,
    /// DLE seen, next byte should be the message type
    Header,
    /// Accumulating the message body until DLE ETX
    Body,
}

/// Outcome of pulling a frame out of a [Read] source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFrame {
    /// A complete frame of the given length is available through [FrameSync::frame]
    Complete(usize),
    /// The scan limit was hit without finding a full frame, call again to continue
    NoMessage,
    /// The source is exhausted
    EndOfInput,
}

/// BINR frame synchronizer.
///
/// A frame looks like `DLE TYPE payload DLE ETX` where every DLE in the payload
/// is sent twice. The synchronizer collapses the doubled DLE and keeps the frame,
/// terminator included, in an internal buffer that can be borrowed with [FrameSync::frame]
/// once a frame completes.
///
/// Bytes can be pushed one at a time from a stream:
/// ```
/// use nvs::FrameSync;
///
/// let mut sync = FrameSync::new();
/// let mut got = None;
/// for byte in [0x10, 0x4A, 0x10, 0x10, 0x01, 0x10, 0x03] {
///     if let Some(Ok(len)) = sync.push(byte) {
///         got = Some(len);
///     }
/// }
/// assert_eq!(got, Some(6));
/// assert_eq!(sync.frame(), &[0x10, 0x4A, 0x10, 0x01, 0x10, 0x03]);
/// ```
#[derive(Debug)]
pub struct FrameSync {
    buf: Vec<u8>,
    state: SyncState,
    odd: bool,
    len: usize,
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSync {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MAX_FRAME_LEN),
            state: SyncState::Idle,
            odd: false,
            len: 0,
        }
    }

    /// Last completed frame, empty until one completes
    pub fn frame(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of bytes accumulated for the frame in progress
    pub fn buffer_len(&self) -> usize {
        match self.state {
            SyncState::Idle => 0,
            _ => self.buf.len(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == SyncState::Idle
    }

    /// Drops any partially received frame
    pub fn reset(&mut self) {
        self.buf.clear();
        self.len = 0;
        self.odd = false;
        self.state = SyncState::Idle;
    }

    fn begin(&mut self) {
        self.buf.clear();
        self.len = 0;
        self.buf.push(NVS_SYNC_CHAR);
        self.state = SyncState::Header;
    }

    /// Feeds one byte. Returns `None` while no frame is complete, the length of the
    /// frame once `DLE ETX` is seen, or an error if the buffer overflowed.
    pub fn push(&mut self, byte: u8) -> Option<Result<usize, ParserError>> {
        match self.state {
            SyncState::Idle => {
                if byte == NVS_SYNC_CHAR {
                    self.begin();
                }
                return None;
            },
            SyncState::Header => {
                // DLE DLE or DLE ETX cannot start a frame, keep waiting for a type byte
                self.odd = false;
                if byte != NVS_SYNC_CHAR && byte != NVS_END_CHAR {
                    self.buf.push(byte);
                    self.state = SyncState::Body;
                }
                return None;
            },
            SyncState::Body => {},
        }

        if byte == NVS_SYNC_CHAR {
            self.odd = !self.odd;
        }
        if byte != NVS_SYNC_CHAR || self.odd {
            self.buf.push(byte);
        }
        if byte == NVS_END_CHAR && self.odd {
            self.len = self.buf.len();
            self.state = SyncState::Idle;
            trace!("frame complete: type={:02x} len={}", self.buf[1], self.len);
            return Some(Ok(self.len));
        }
        if self.buf.len() >= MAX_FRAME_LEN {
            let len = self.buf.len();
            warn!("frame size error: len={}", len);
            self.reset();
            return Some(Err(ParserError::FrameTooLong { len }));
        }
        None
    }

    /// Feeds a chunk of bytes, returning an iterator-like object yielding the frames
    /// found in it. Frames left incomplete at the end of the chunk carry over to the
    /// next call.
    pub fn consume<'a>(&'a mut self, data: &'a [u8]) -> FrameIter<'a> {
        FrameIter {
            sync: self,
            data,
            pos: 0,
        }
    }

    /// Pulls bytes from `reader` until a full frame is available.
    ///
    /// Both the search for the frame start and the frame body are bounded by a scan
    /// limit, after which [FileFrame::NoMessage] is returned so the caller can keep
    /// control over non conforming input.
    pub fn read_frame<R: Read>(&mut self, reader: &mut R) -> Result<FileFrame, ParserError> {
        self.reset();

        let mut scanned = 0;
        loop {
            let Some(byte) = read_byte(reader)? else {
                return Ok(FileFrame::EndOfInput);
            };
            if byte == NVS_SYNC_CHAR {
                let Some(next) = read_byte(reader)? else {
                    return Ok(FileFrame::EndOfInput);
                };
                if next != NVS_SYNC_CHAR && next != NVS_END_CHAR {
                    self.begin();
                    self.buf.push(next);
                    break;
                }
            }
            if scanned >= FILE_SCAN_LIMIT {
                return Ok(FileFrame::NoMessage);
            }
            scanned += 1;
        }

        let mut odd = false;
        let mut scanned = 0;
        loop {
            let Some(byte) = read_byte(reader)? else {
                self.reset();
                return Ok(FileFrame::EndOfInput);
            };
            if byte == NVS_SYNC_CHAR {
                odd = !odd;
            }
            if byte != NVS_SYNC_CHAR || odd {
                self.buf.push(byte);
            }
            if byte == NVS_END_CHAR && odd {
                break;
            }
            if scanned >= FILE_SCAN_LIMIT {
                self.reset();
                return Ok(FileFrame::NoMessage);
            }
            scanned += 1;
        }

        let len = self.buf.len();
        self.state = SyncState::Idle;
        if len > MAX_FRAME_LEN {
            warn!("frame length error: len={}", len);
            self.reset();
            return Err(ParserError::FrameTooLong { len });
        }
        self.len = len;
        Ok(FileFrame::Complete(len))
    }
}

fn read_byte<R: Read>(reader: &mut R) -> Result<Option<u8>, ParserError> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => {},
            Err(e) => return Err(ParserError::Io(e)),
        }
    }
}

/// Iterator-like object over the frames of one chunk, see [FrameSync::consume]
pub struct FrameIter<'a> {
    sync: &'a mut FrameSync,
    data: &'a [u8],
    pos: usize,
}

impl FrameIter<'_> {
    /// Analog of `core::iter::Iterator::next`, should be switched to
    /// trait implementation after merge of `<https://github.com/rust-lang/rust/issues/44265>`
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Result<&[u8], ParserError>> {
        while self.pos < self.data.len() {
            let byte = self.data[self.pos];
            self.pos += 1;
            if let Some(result) = self.sync.push(byte) {
                return Some(result.map(|_| self.sync.frame()));
            }
        }
        None
    }
}

/// Appends `payload` to `out`, sending every DLE twice
pub fn stuff_bytes(payload: &[u8], out: &mut Vec<u8>) {
    for &byte in payload {
        out.push(byte);
        if byte == NVS_SYNC_CHAR {
            out.push(byte);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn push_all(sync: &mut FrameSync, bytes: &[u8]) -> Vec<Result<Vec<u8>, String>> {
        let mut out = Vec::new();
        let mut it = sync.consume(bytes);
        while let Some(res) = it.next() {
            out.push(res.map(|f| f.to_vec()).map_err(|e| e.to_string()));
        }
        out
    }

    #[test]
    fn collapses_doubled_sync() {
        let mut sync = FrameSync::new();
        let frames = push_all(&mut sync, &[0x10, 0x4B, 0x10, 0x10, 0x10, 0x10, 0x03, 0x10, 0x03]);
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].as_ref().unwrap(),
            &vec![0x10, 0x4B, 0x10, 0x10, 0x03, 0x10, 0x03]
        );
    }

    #[test]
    fn ignores_garbage_before_sync() {
        let mut sync = FrameSync::new();
        let frames = push_all(&mut sync, &[0xAA, 0x03, 0x55, 0x10, 0x4A, 0x01, 0x02, 0x10, 0x03]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &vec![0x10, 0x4A, 0x01, 0x02, 0x10, 0x03]);
        assert!(sync.is_idle());
    }

    #[test]
    fn header_noise_waits_for_type_byte() {
        let mut sync = FrameSync::new();
        // trailing DLE ETX of a lost frame, then a real one
        let frames = push_all(&mut sync, &[0x10, 0x03, 0x10, 0x4A, 0x07, 0x10, 0x03]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &vec![0x10, 0x4A, 0x07, 0x10, 0x03]);
    }

    #[test]
    fn frame_split_across_chunks() {
        let mut sync = FrameSync::new();
        assert!(push_all(&mut sync, &[0x10, 0xF7, 0x01]).is_empty());
        assert_eq!(sync.buffer_len(), 3);
        let frames = push_all(&mut sync, &[0x10, 0x10, 0x10, 0x03]);
        assert_eq!(frames[0].as_ref().unwrap(), &vec![0x10, 0xF7, 0x01, 0x10, 0x10, 0x03]);
    }

    #[test]
    fn overflow_resets() {
        let mut sync = FrameSync::new();
        let mut data = vec![0x10, 0xF5];
        data.extend(std::iter::repeat(0x55).take(MAX_FRAME_LEN));
        let frames = push_all(&mut sync, &data);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_err());
        assert!(sync.is_idle());
        assert_eq!(sync.buffer_len(), 0);
    }

    #[test]
    fn overflow_error_code() {
        let mut sync = FrameSync::new();
        let mut last = None;
        sync.push(0x10);
        sync.push(0xF5);
        for _ in 0..MAX_FRAME_LEN {
            if let Some(res) = sync.push(0x00) {
                last = Some(res);
                break;
            }
        }
        let Some(Err(err)) = last else {
            panic!("overflow not reported");
        };
        assert!(matches!(err, ParserError::FrameTooLong { len } if len == MAX_FRAME_LEN));
        assert_eq!(err.code(), -1);
    }

    #[test]
    fn file_reads_consecutive_frames() {
        let mut sync = FrameSync::new();
        let mut cursor = Cursor::new(vec![
            0x00, 0x10, 0x4A, 0x10, 0x10, 0x10, 0x03, 0x10, 0x88, 0x01, 0x10, 0x03,
        ]);
        assert_eq!(sync.read_frame(&mut cursor).unwrap(), FileFrame::Complete(5));
        assert_eq!(sync.frame(), &[0x10, 0x4A, 0x10, 0x10, 0x03]);
        assert_eq!(sync.read_frame(&mut cursor).unwrap(), FileFrame::Complete(5));
        assert_eq!(sync.frame(), &[0x10, 0x88, 0x01, 0x10, 0x03]);
        assert_eq!(sync.read_frame(&mut cursor).unwrap(), FileFrame::EndOfInput);
    }

    #[test]
    fn file_truncated_frame_is_end_of_input() {
        let mut sync = FrameSync::new();
        let mut cursor = Cursor::new(vec![0x10, 0xF5, 0x01, 0x02]);
        assert_eq!(sync.read_frame(&mut cursor).unwrap(), FileFrame::EndOfInput);
    }

    #[test]
    fn file_bounded_sync_search() {
        let mut sync = FrameSync::new();
        let mut data = vec![0u8; 5000];
        data.extend_from_slice(&[0x10, 0x4A, 0x01, 0x10, 0x03]);
        let mut cursor = Cursor::new(data);
        assert_eq!(sync.read_frame(&mut cursor).unwrap(), FileFrame::NoMessage);
        assert_eq!(sync.read_frame(&mut cursor).unwrap(), FileFrame::Complete(5));
    }

    #[test]
    fn file_frame_too_long() {
        let mut sync = FrameSync::new();
        let mut data = vec![0x10, 0xF5];
        data.extend(std::iter::repeat(0x55).take(MAX_FRAME_LEN - 2));
        data.extend_from_slice(&[0x10, 0x03]);
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            sync.read_frame(&mut cursor),
            Err(ParserError::FrameTooLong { len }) if len == MAX_FRAME_LEN + 2
        ));
    }

    #[test]
    fn stuffing_doubles_sync_only() {
        let mut out = Vec::new();
        stuff_bytes(&[0x01, 0x10, 0x03, 0x10], &mut out);
        assert_eq!(out, vec![0x01, 0x10, 0x10, 0x03, 0x10, 0x10]);
    }
}
