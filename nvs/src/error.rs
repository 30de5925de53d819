use std::fmt;

/// Error that possible during frame synchronization and packets decoding
#[derive(Debug)]
pub enum ParserError {
    /// No terminator found before the accumulation buffer filled up
    FrameTooLong {
        len: usize,
    },
    InvalidField {
        packet: &'static str,
        field: &'static str,
    },
    InvalidPacketLen {
        packet: &'static str,
        expect: usize,
        got: usize,
    },
    InvalidWeek {
        packet: &'static str,
        week: u16,
    },
    UnknownSatellite {
        packet: &'static str,
        prn: u8,
    },
    Io(std::io::Error),
}

impl ParserError {
    /// Numeric status reported for any error
    pub const fn code(&self) -> i32 {
        -1
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::FrameTooLong { len } => {
                write!(f, "Frame exceeds {} bytes without terminator", len)
            },
            ParserError::InvalidField { packet, field } => {
                write!(f, "Invalid field {} of packet {}", field, packet)
            },
            ParserError::InvalidPacketLen {
                packet,
                expect,
                got,
            } => write!(
                f,
                "Invalid packet({}) length, expect {}, got {}",
                packet, expect, got
            ),
            ParserError::InvalidWeek { packet, week } => {
                write!(f, "Invalid week {} in packet {}", week, packet)
            },
            ParserError::UnknownSatellite { packet, prn } => {
                write!(f, "Unknown satellite prn={} in packet {}", prn, packet)
            },
            ParserError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ParserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParserError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ParserError {
    fn from(e: std::io::Error) -> Self {
        ParserError::Io(e)
    }
}

/// Error while building an outgoing command frame
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    InvalidArgument {
        command: &'static str,
        arg: String,
    },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => f.write_str("empty command"),
            CommandError::Unknown(name) => write!(f, "unknown command '{}'", name),
            CommandError::InvalidArgument { command, arg } => {
                write!(f, "invalid argument '{}' for {}", arg, command)
            },
        }
    }
}

impl std::error::Error for CommandError {}

/// Error while parsing a decoder option string
#[derive(Debug, Clone, PartialEq)]
pub enum OptionError {
    InvalidValue { option: &'static str, value: String },
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionError::InvalidValue { option, value } => {
                write!(f, "invalid value '{}' for option {}", value, option)
            },
        }
    }
}

impl std::error::Error for OptionError {}
