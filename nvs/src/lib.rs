//! # nvs
//!
//! Decoder for the BINR binary protocol of NVS GNSS receivers (NV08C family).
//! It turns the byte stream of a receiver into raw GPS, GLONASS and SBAS
//! observations, broadcast ephemerides, almanacs, ionosphere and UTC parameters,
//! SBAS messages and navigation solutions.
//!
//! Decoding a stream
//! =================
//!
//! A [Receiver] synchronizes on the frames and decodes them into its [ReceiverState].
//! Data coming from a serial port can be fed chunk by chunk:
//! ```
//! use nvs::{DecoderOptions, Receiver, Status};
//!
//! let options: DecoderOptions = "-EPHALL".parse().unwrap();
//! let mut receiver = Receiver::new(options);
//! let my_raw_data = vec![1, 2, 3, 4]; // From your serial port
//! for result in receiver.consume(&my_raw_data) {
//!     match result {
//!         Ok(Status::Observation) => {
//!             // receiver.state().observations() holds the new epoch
//!         },
//!         Ok(_) => {},
//!         Err(_) => {
//!             // Received a malformed frame
//!         },
//!     }
//! }
//! ```
//!
//! Recorded files are read frame by frame with [Receiver::input_file], until it
//! returns [Status::EndOfInput].
//!
//! Commands
//! ========
//!
//! Receiver configuration commands are built from their textual form:
//! ```
//! let bytes = nvs::gen_command("CFG-RAWRATE 10");
//! assert_eq!(bytes, vec![0x10, 0xF4, 0x01, 0x10, 0x03]);
//! ```

extern crate gnss_rs as gnss;
#[cfg(feature = "serde")]
extern crate serde;

pub use crate::{
    command::{gen_command, Command},
    constants::{MAX_FRAME_LEN, MAX_OBSERVATIONS, NUM_FREQUENCIES},
    decoder::{Decoder, MessageTag, Status},
    error::{CommandError, OptionError, ParserError},
    extended::{convert_r10, decode_r10, HostOrder},
    nvs_packets::*,
    options::DecoderOptions,
    parser::{stuff_bytes, FileFrame, FrameIter, FrameSync},
    receiver::{Receiver, ReceiverIter},
    sbas::{crc24q, Crc24qSbasDecoder, SbasDecoder, SbasMessage},
    state::{Navigation, ReceiverState},
    sv::{broadcast_prn, resolve_sv},
};

mod command;
pub mod constants;
mod decoder;
mod error;
mod extended;
mod nvs_packets;
mod options;
mod parser;
mod receiver;
mod sbas;
mod state;
mod sv;
pub mod time;
