use core::fmt;

use gnss::prelude::Constellation;

/// Ranging code of an observation slot
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalCode {
    /// Empty slot
    #[default]
    None,
    /// L1 C/A
    L1C,
    /// L1 P(Y)
    L1P,
    /// L2 C/A
    L2C,
    /// L2 P(Y)
    L2P,
    /// L5 / G3 in-phase
    L3I,
}

impl SignalCode {
    /// Civil (C/A) codes
    pub fn is_civil(self) -> bool {
        matches!(self, SignalCode::L1C | SignalCode::L2C)
    }

    /// Precise (P) codes, never replaced by a civil code within one epoch
    pub fn is_precise(self) -> bool {
        matches!(self, SignalCode::L1P | SignalCode::L2P)
    }
}

impl fmt::Display for SignalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalCode::None => "none",
            SignalCode::L1C => "L1C",
            SignalCode::L1P => "L1P",
            SignalCode::L2C => "L2C",
            SignalCode::L2P => "L2P",
            SignalCode::L3I => "L3I",
        };
        f.write_str(s)
    }
}

/// What a raw measurement signal type byte stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalType {
    pub constellation: Constellation,
    /// Frequency slot, 0..3
    pub slot: usize,
    pub code: SignalCode,
}

const fn signal(constellation: Constellation, slot: usize, code: SignalCode) -> SignalType {
    SignalType {
        constellation,
        slot,
        code,
    }
}

use Constellation::{Glonass as GLO, GPS, SBAS as SBS};
use SignalCode::{L1C, L1P, L2C, L2P, L3I};

static SIGNAL_TYPES: [(u8, SignalType); 23] = [
    (1, signal(GLO, 0, L1C)),
    (2, signal(GPS, 0, L1C)),
    (3, signal(GLO, 1, L2C)),
    (4, signal(SBS, 0, L1C)),
    (5, signal(GLO, 0, L1P)),
    (6, signal(GLO, 1, L2P)),
    (17, signal(GLO, 0, L1P)),
    (33, signal(GLO, 1, L2C)),
    (34, signal(GPS, 1, L2C)),
    (49, signal(GLO, 1, L2P)),
    (50, signal(GPS, 1, L2C)),
    (65, signal(GLO, 0, L1C)),
    (66, signal(GPS, 2, L3I)),
    (68, signal(SBS, 2, L3I)),
    (81, signal(GLO, 0, L1C)),
    (82, signal(GPS, 2, L3I)),
    (84, signal(SBS, 2, L3I)),
    (129, signal(GLO, 0, L1C)),
    (130, signal(GPS, 0, L1C)),
    (161, signal(GLO, 1, L1C)),
    (162, signal(GPS, 1, L1C)),
    (193, signal(GLO, 2, L3I)),
    (194, signal(GPS, 2, L3I)),
];

impl SignalType {
    /// Looks up a wire signal type, `None` for types the receiver should not send
    pub fn from_wire(value: u8) -> Option<Self> {
        SIGNAL_TYPES
            .iter()
            .find(|(id, _)| *id == value)
            .map(|(_, signal)| *signal)
    }
}
