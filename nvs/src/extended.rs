//! Conversion of the receiver's 80-bit extended precision values.
//!
//! The receiver sends some time tags as x87 style extended floats: a 64-bit
//! mantissa with an explicit integer bit, followed by a sign bit and a 15-bit
//! exponent biased by 16383. On the wire they occupy ten bytes that are loaded as
//! one `u16` and two `u32` words. How the words split the value depends on the byte
//! order used to load them, so both layouts are supported and the one matching the
//! host is selected at runtime.

/// Byte order the extended float words are loaded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HostOrder {
    Little,
    Big,
}

impl HostOrder {
    /// Detects the byte order of the running host
    pub fn native() -> Self {
        let word: u32 = 0x1234_5678;
        if word.to_ne_bytes()[0] == 0x12 {
            HostOrder::Big
        } else {
            HostOrder::Little
        }
    }

    pub(crate) fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            HostOrder::Little => u16::from_le_bytes(bytes),
            HostOrder::Big => u16::from_be_bytes(bytes),
        }
    }

    pub(crate) fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            HostOrder::Little => u32::from_le_bytes(bytes),
            HostOrder::Big => u32::from_be_bytes(bytes),
        }
    }
}

impl Default for HostOrder {
    fn default() -> Self {
        Self::native()
    }
}

const EXTENDED_EXP_MAX: u32 = 0x7FFF;
/// 16383 - 1023
const EXP_BIAS_DELTA: i32 = 15360;
const DOUBLE_EXP_MAX: i32 = 0x7FF;
const FRACTION_MASK: u64 = (1 << 52) - 1;

/// Rebuilds a double from the three words of an extended float.
///
/// With [HostOrder::Little] `part1` holds mantissa bits 0..16, `part2` bits 16..48
/// and `part3` bits 48..64 plus sign and exponent in its upper half. With
/// [HostOrder::Big] `part1` holds sign and exponent, `part2` the upper and `part3`
/// the lower half of the mantissa.
///
/// The mantissa is truncated to 52 bits. Exponents that do not fit a double are
/// flushed to a signed zero or to infinity.
pub fn convert_r10(part1: u16, part2: u32, part3: u32, order: HostOrder) -> f64 {
    let (sign, exponent, mantissa) = match order {
        HostOrder::Little => (
            part3 >> 31,
            (part3 >> 16) & EXTENDED_EXP_MAX,
            ((part3 as u64 & 0xFFFF) << 48) | ((part2 as u64) << 16) | part1 as u64,
        ),
        HostOrder::Big => (
            (part1 as u32) >> 15,
            part1 as u32 & EXTENDED_EXP_MAX,
            ((part2 as u64) << 32) | part3 as u64,
        ),
    };
    let sign = (sign as u64) << 63;
    let fraction = (mantissa >> 11) & FRACTION_MASK;

    if exponent == 0 {
        return f64::from_bits(sign);
    }
    if exponent == EXTENDED_EXP_MAX {
        // fraction excludes the explicit integer bit
        let nan = if fraction != 0 { fraction | (1 << 51) } else { 0 };
        return f64::from_bits(sign | ((DOUBLE_EXP_MAX as u64) << 52) | nan);
    }

    let exponent = exponent as i32 - EXP_BIAS_DELTA;
    if exponent <= 0 {
        f64::from_bits(sign)
    } else if exponent >= DOUBLE_EXP_MAX {
        f64::from_bits(sign | ((DOUBLE_EXP_MAX as u64) << 52))
    } else {
        f64::from_bits(sign | ((exponent as u64) << 52) | fraction)
    }
}

/// Loads the three words from ten wire bytes with the given byte order and converts them
pub fn decode_r10(bytes: [u8; 10], order: HostOrder) -> f64 {
    let part1 = order.read_u16([bytes[0], bytes[1]]);
    let part2 = order.read_u32([bytes[2], bytes[3], bytes[4], bytes[5]]);
    let part3 = order.read_u32([bytes[6], bytes[7], bytes[8], bytes[9]]);
    convert_r10(part1, part2, part3, order)
}

#[cfg(test)]
mod test {
    use super::*;

    /// Splits a normal double into the three words expected by each path
    fn words(value: f64, order: HostOrder) -> (u16, u32, u32) {
        let bits = value.to_bits();
        let sign = (bits >> 63) as u32;
        let exp = ((bits >> 52) & 0x7FF) as u32;
        let frac = bits & FRACTION_MASK;
        let se = (sign << 15) | (exp + EXP_BIAS_DELTA as u32);
        let m = (1u64 << 63) | (frac << 11);
        match order {
            HostOrder::Little => (
                (m & 0xFFFF) as u16,
                (m >> 16) as u32,
                ((m >> 48) & 0xFFFF) as u32 | (se << 16),
            ),
            HostOrder::Big => (se as u16, (m >> 32) as u32, m as u32),
        }
    }

    #[test]
    fn one_on_little_path() {
        assert_eq!(convert_r10(0, 0, 0x3FFF_8000, HostOrder::Little), 1.0);
    }

    #[test]
    fn negative_on_both_paths() {
        assert_eq!(convert_r10(0, 0, 0xC000_A000, HostOrder::Little), -2.5);
        assert_eq!(convert_r10(0xC000, 0xA000_0000, 0, HostOrder::Big), -2.5);
    }

    #[test]
    fn exact_bit_patterns() {
        let values = [
            1.0,
            -1.0,
            0.5,
            123_456_789.125,
            -0.001,
            518_400_000.0,
            f64::MIN_POSITIVE,
            f64::MAX,
            -f64::MAX,
            core::f64::consts::PI,
        ];
        for order in [HostOrder::Little, HostOrder::Big] {
            for value in values {
                let (p1, p2, p3) = words(value, order);
                let got = convert_r10(p1, p2, p3, order);
                assert_eq!(got.to_bits(), value.to_bits(), "{:?} {}", order, value);
            }
        }
    }

    #[test]
    fn zero_keeps_sign() {
        assert_eq!(convert_r10(0, 0, 0, HostOrder::Little).to_bits(), 0);
        assert_eq!(convert_r10(0, 0, 0x8000_0000, HostOrder::Little).to_bits(), 1 << 63);
        assert_eq!(convert_r10(0x8000, 0, 0, HostOrder::Big).to_bits(), 1 << 63);
    }

    #[test]
    fn out_of_range_exponents() {
        // 2^-16000 is below the smallest double
        let tiny = 16383 - 16000;
        assert_eq!(convert_r10(tiny, 0x8000_0000, 0, HostOrder::Big), 0.0);
        // 2^+2000 is above the largest double
        let huge = 16383 + 2000;
        assert_eq!(
            convert_r10(0, 0, (huge << 16) | 0x8000, HostOrder::Little),
            f64::INFINITY
        );
        assert_eq!(convert_r10(0xFFFF, 0x8000_0000, 0, HostOrder::Big), f64::NEG_INFINITY);
        assert!(convert_r10(0x7FFF, 0xC000_0000, 0, HostOrder::Big).is_nan());
    }

    #[test]
    fn wire_bytes_of_x87_value() {
        // 604_799_000 ms, the last millisecond tick of a week
        let value = 604_799_000.0_f64;
        let (p1, p2, p3) = words(value, HostOrder::Little);
        let mut bytes = [0u8; 10];
        bytes[..2].copy_from_slice(&p1.to_le_bytes());
        bytes[2..6].copy_from_slice(&p2.to_le_bytes());
        bytes[6..].copy_from_slice(&p3.to_le_bytes());
        assert_eq!(decode_r10(bytes, HostOrder::Little), value);
    }

    #[test]
    fn native_order_matches_target() {
        let expected = if cfg!(target_endian = "big") {
            HostOrder::Big
        } else {
            HostOrder::Little
        };
        assert_eq!(HostOrder::native(), expected);
    }
}
