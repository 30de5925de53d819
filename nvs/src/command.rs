use std::{fmt, str::FromStr};

use log::warn;

use crate::{
    constants::{NVS_END_CHAR, NVS_SYNC_CHAR},
    error::CommandError,
    parser::stuff_bytes,
};

const ID_ADVANCED: u8 = 0xD7;
const ID_PVT_RATE: u8 = 0x02;
const ID_SMOOTH: u8 = 0x03;
const ID_RAW_RATE: u8 = 0xF4;

/// Outgoing receiver configuration command.
///
/// Commands parse from the textual form used in receiver command files:
/// ```
/// use nvs::Command;
///
/// let cmd: Command = "CFG-RAWRATE 5".parse().unwrap();
/// assert_eq!(cmd, Command::RawRate(Some(5)));
/// assert_eq!(cmd.to_bytes(), vec![0x10, 0xF4, 0x02, 0x10, 0x03]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `CFG-PVTRATE [n]`: navigation solution rate in Hz
    PvtRate(Option<u8>),
    /// `CFG-RAWRATE [n]`: raw measurement rate in Hz, 2, 5 or 10, 1 Hz otherwise
    RawRate(Option<i32>),
    /// `CFG-SMOOTH`: enable pseudorange smoothing
    Smooth,
    /// `CFG-BINR <hex>...`: raw message bytes, message id first
    Binr(Vec<u8>),
}

impl Command {
    /// Message bytes between the leading DLE and the terminator, before stuffing
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Command::PvtRate(rate) => {
                let mut payload = vec![ID_ADVANCED, ID_PVT_RATE];
                payload.extend(rate);
                payload
            },
            Command::RawRate(rate) => {
                let mut payload = vec![ID_RAW_RATE];
                // interval in units of 100 ms
                payload.extend(rate.map(|rate| match rate {
                    2 => 5,
                    5 => 2,
                    10 => 1,
                    _ => 10,
                }));
                payload
            },
            Command::Smooth => vec![ID_ADVANCED, ID_SMOOTH, 0x01, 0x00],
            Command::Binr(bytes) => bytes.clone(),
        }
    }

    /// Complete frame, DLE stuffed and terminated
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut out = Vec::with_capacity(payload.len() * 2 + 3);
        out.push(NVS_SYNC_CHAR);
        stuff_bytes(&payload, &mut out);
        out.push(NVS_SYNC_CHAR);
        out.push(NVS_END_CHAR);
        out
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::PvtRate(_) => "CFG-PVTRATE",
            Command::RawRate(_) => "CFG-RAWRATE",
            Command::Smooth => "CFG-SMOOTH",
            Command::Binr(_) => "CFG-BINR",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        match self {
            Command::PvtRate(Some(rate)) => write!(f, " {}", rate),
            Command::RawRate(Some(rate)) => write!(f, " {}", rate),
            Command::Binr(bytes) => bytes.iter().try_for_each(|b| write!(f, " {:02X}", b)),
            _ => Ok(()),
        }
    }
}

/// Up to two leading hex digits of a token, tokens without any are skipped
fn parse_hex_byte(token: &str) -> Option<u8> {
    let end = token
        .char_indices()
        .take(2)
        .take_while(|(_, c)| c.is_ascii_hexdigit())
        .last()
        .map(|(i, c)| i + c.len_utf8())?;
    u8::from_str_radix(&token[..end], 16).ok()
}

fn parse_rate(command: &'static str, arg: Option<&str>) -> Result<Option<i32>, CommandError> {
    arg.map(|arg| {
        arg.parse().map_err(|_| CommandError::InvalidArgument {
            command,
            arg: arg.to_string(),
        })
    })
    .transpose()
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut args = s.split_whitespace();
        let name = args.next().ok_or(CommandError::Empty)?;
        match name {
            "CFG-PVTRATE" => {
                let rate = parse_rate("CFG-PVTRATE", args.next())?
                    .map(|rate| {
                        u8::try_from(rate).map_err(|_| CommandError::InvalidArgument {
                            command: "CFG-PVTRATE",
                            arg: rate.to_string(),
                        })
                    })
                    .transpose()?;
                Ok(Command::PvtRate(rate))
            },
            "CFG-RAWRATE" => Ok(Command::RawRate(parse_rate("CFG-RAWRATE", args.next())?)),
            "CFG-SMOOTH" => Ok(Command::Smooth),
            "CFG-BINR" => Ok(Command::Binr(args.filter_map(parse_hex_byte).collect())),
            _ => Err(CommandError::Unknown(name.to_string())),
        }
    }
}

/// Builds the frame for a textual command, empty for unknown or invalid commands
pub fn gen_command(msg: &str) -> Vec<u8> {
    match msg.parse::<Command>() {
        Ok(cmd) => cmd.to_bytes(),
        Err(e) => {
            warn!("command not generated: {}", e);
            Vec::new()
        },
    }
}
