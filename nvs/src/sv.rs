use gnss::prelude::{Constellation, SV};

use crate::constants::SBAS_PRN_OFFSET;

const GPS_PRN_MAX: u8 = 32;
const GLONASS_PRN_MAX: u8 = 27;
const SBAS_PRN_MIN: u8 = 120;
const SBAS_PRN_MAX: u8 = 158;

/// Maps a broadcast PRN to a satellite of the given constellation.
///
/// SBAS satellites are given with their broadcast PRN (120..=158) and numbered
/// like RINEX does, `S20` for PRN 120.
pub fn resolve_sv(constellation: Constellation, prn: u8) -> Option<SV> {
    match constellation {
        Constellation::GPS if (1..=GPS_PRN_MAX).contains(&prn) => Some(SV::new(constellation, prn)),
        Constellation::Glonass if (1..=GLONASS_PRN_MAX).contains(&prn) => {
            Some(SV::new(constellation, prn))
        },
        Constellation::SBAS if (SBAS_PRN_MIN..=SBAS_PRN_MAX).contains(&prn) => {
            Some(SV::new(constellation, prn - 100))
        },
        _ => None,
    }
}

/// Broadcast PRN of a satellite, undoing the SBAS numbering of [resolve_sv]
pub fn broadcast_prn(sv: SV) -> u8 {
    match sv.constellation {
        Constellation::SBAS => sv.prn + 100,
        _ => sv.prn,
    }
}

/// SBAS PRN as carried in raw records, relative to PRN 120
pub(crate) fn sbas_wire_prn(prn: u8) -> Option<u8> {
    prn.checked_add(SBAS_PRN_OFFSET)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prn_ranges() {
        assert_eq!(resolve_sv(Constellation::GPS, 1), Some(SV::new(Constellation::GPS, 1)));
        assert_eq!(resolve_sv(Constellation::GPS, 32).map(|sv| sv.prn), Some(32));
        assert!(resolve_sv(Constellation::GPS, 0).is_none());
        assert!(resolve_sv(Constellation::GPS, 33).is_none());
        assert!(resolve_sv(Constellation::Glonass, 24).is_some());
        assert!(resolve_sv(Constellation::Glonass, 28).is_none());
        assert!(resolve_sv(Constellation::Galileo, 1).is_none());
    }

    #[test]
    fn sbas_numbering() {
        let sv = resolve_sv(Constellation::SBAS, 124).unwrap();
        assert_eq!(sv.prn, 24);
        assert_eq!(broadcast_prn(sv), 124);
        assert!(resolve_sv(Constellation::SBAS, 119).is_none());
        assert!(resolve_sv(Constellation::SBAS, 159).is_none());
        assert_eq!(sbas_wire_prn(4), Some(124));
        assert_eq!(sbas_wire_prn(200), None);
    }
}
