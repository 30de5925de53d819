use std::str::FromStr;

use log::debug;

use crate::{constants::MAX_WEEK, error::OptionError, extended::HostOrder, time::current_week};

/// Runtime switches of the decoder.
///
/// They can be built field by field or parsed from the usual space delimited
/// option string:
/// ```
/// use nvs::DecoderOptions;
///
/// let opts: DecoderOptions = "-EPHALL -TADJ=1.0".parse().unwrap();
/// assert!(opts.accept_all_ephemerides);
/// assert_eq!(opts.time_tag_adjustment, Some(1.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoderOptions {
    /// `-EPHALL`: store every GPS ephemeris, even with an unchanged IODE
    pub accept_all_ephemerides: bool,
    /// `-TADJ=<s>`: snap observation epochs to multiples of this interval
    pub time_tag_adjustment: Option<f64>,
    /// `-GLOALM`: decode GLONASS almanacs
    pub glonass_almanac: bool,
    /// `-WEEK=<n>`: GPS week used to resolve week rollovers, the current week otherwise
    pub reference_week: Option<u32>,
    /// Byte order used to load extended floats, the host's otherwise
    pub host_order: Option<HostOrder>,
}

impl DecoderOptions {
    pub fn with_accept_all_ephemerides(mut self, accept: bool) -> Self {
        self.accept_all_ephemerides = accept;
        self
    }

    pub fn with_time_tag_adjustment(mut self, interval: f64) -> Self {
        self.time_tag_adjustment = Some(interval);
        self
    }

    pub fn with_glonass_almanac(mut self, enable: bool) -> Self {
        self.glonass_almanac = enable;
        self
    }

    pub fn with_reference_week(mut self, week: u32) -> Self {
        self.reference_week = Some(week);
        self
    }

    pub fn with_host_order(mut self, order: HostOrder) -> Self {
        self.host_order = Some(order);
        self
    }

    pub fn reference_week(&self) -> u32 {
        self.reference_week.unwrap_or_else(current_week)
    }

    pub fn host_order(&self) -> HostOrder {
        self.host_order.unwrap_or_else(HostOrder::native)
    }

    /// Time tag adjustment interval, if enabled with a positive finite value
    pub(crate) fn tadj(&self) -> Option<f64> {
        self.time_tag_adjustment
            .filter(|interval| interval.is_finite() && *interval > 0.0)
    }
}

impl FromStr for DecoderOptions {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut opts = DecoderOptions::default();
        for token in s.split_whitespace() {
            let (key, value) = match token.split_once('=') {
                Some((key, value)) => (key.to_ascii_uppercase(), Some(value)),
                None => (token.to_ascii_uppercase(), None),
            };
            match (key.as_str(), value) {
                ("-EPHALL", _) => opts.accept_all_ephemerides = true,
                ("-GLOALM", _) => opts.glonass_almanac = true,
                ("-TADJ", Some(value)) => {
                    let interval = value.parse().map_err(|_| OptionError::InvalidValue {
                        option: "-TADJ",
                        value: value.to_string(),
                    })?;
                    opts.time_tag_adjustment = Some(interval);
                },
                ("-WEEK", Some(value)) => {
                    let week = value
                        .parse::<u32>()
                        .ok()
                        .filter(|week| *week < MAX_WEEK as u32)
                        .ok_or_else(|| OptionError::InvalidValue {
                            option: "-WEEK",
                            value: value.to_string(),
                        })?;
                    opts.reference_week = Some(week);
                },
                _ => debug!("ignored option '{}'", token),
            }
        }
        Ok(opts)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_all_options() {
        let opts: DecoderOptions = "-EPHALL -tadj=0.5 -GLOALM -WEEK=2300".parse().unwrap();
        assert_eq!(
            opts,
            DecoderOptions::default()
                .with_accept_all_ephemerides(true)
                .with_time_tag_adjustment(0.5)
                .with_glonass_almanac(true)
                .with_reference_week(2300)
        );
        assert_eq!(opts.reference_week(), 2300);
    }

    #[test]
    fn unknown_options_are_ignored() {
        let opts: DecoderOptions = "-FOO  -BAR=1".parse().unwrap();
        assert_eq!(opts, DecoderOptions::default());
        assert_eq!(opts.tadj(), None);
    }

    #[test]
    fn invalid_values() {
        assert_eq!(
            "-TADJ=abc".parse::<DecoderOptions>(),
            Err(OptionError::InvalidValue {
                option: "-TADJ",
                value: "abc".to_string()
            })
        );
        assert!("-WEEK=-1".parse::<DecoderOptions>().is_err());
    }

    #[test]
    fn reference_week_range() {
        let opts: DecoderOptions = "-WEEK=4095".parse().unwrap();
        assert_eq!(opts.reference_week(), 4095);
        for week in ["4096", "3000000000"] {
            assert_eq!(
                format!("-WEEK={}", week).parse::<DecoderOptions>(),
                Err(OptionError::InvalidValue {
                    option: "-WEEK",
                    value: week.to_string()
                })
            );
        }
    }

    #[test]
    fn non_positive_adjustment_is_disabled() {
        let opts = DecoderOptions::default().with_time_tag_adjustment(0.0);
        assert_eq!(opts.tadj(), None);
        for interval in [-1.0, f64::NAN, f64::INFINITY] {
            let opts = DecoderOptions::default().with_time_tag_adjustment(interval);
            assert_eq!(opts.tadj(), None);
        }
        let opts: DecoderOptions = "-TADJ=inf".parse().unwrap();
        assert_eq!(opts.tadj(), None);
    }
}
