use std::collections::HashMap;

use gnss::prelude::SV;
use hifitime::Epoch;

use crate::{
    decoder::MessageTag,
    nvs_packets::{
        GlonassAlmanac, GlonassEphemeris, GpsAlmanac, GpsEphemeris, IonosphereParameters,
        Observation, Pvt, UtcParameters,
    },
    sbas::SbasMessage,
};

/// Navigation data gathered from ephemeris, almanac and time scale messages
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Navigation {
    pub gps_ephemerides: HashMap<SV, GpsEphemeris>,
    pub glonass_ephemerides: HashMap<SV, GlonassEphemeris>,
    pub gps_almanacs: HashMap<SV, GpsAlmanac>,
    pub glonass_almanacs: HashMap<SV, GlonassAlmanac>,
    pub ionosphere: IonosphereParameters,
    pub utc: UtcParameters,
}

/// Everything the decoder learned from the messages of one session
#[derive(Debug, Default, Clone)]
pub struct ReceiverState {
    pub(crate) last_epoch: Option<Epoch>,
    pub(crate) observations: Vec<Observation>,
    pub(crate) navigation: Navigation,
    pub(crate) pvt: Option<Pvt>,
    pub(crate) sbas: Option<SbasMessage>,
    /// Last flags of each (satellite, frequency slot), for cycle slip detection
    pub(crate) half_cycle: HashMap<(SV, usize), u8>,
    pub(crate) last_ephemeris: Option<SV>,
    pub(crate) last_tag: Option<MessageTag>,
}

impl ReceiverState {
    /// Epoch of the last accepted raw measurements
    pub fn last_epoch(&self) -> Option<Epoch> {
        self.last_epoch
    }

    /// Observations of the last accepted epoch
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn pvt(&self) -> Option<&Pvt> {
        self.pvt.as_ref()
    }

    /// Last SBAS message accepted by the SBAS decoder
    pub fn sbas(&self) -> Option<&SbasMessage> {
        self.sbas.as_ref()
    }

    /// Satellite whose ephemeris was stored last
    pub fn last_ephemeris(&self) -> Option<SV> {
        self.last_ephemeris
    }

    /// Tag of the last frame handed to the decoder
    pub fn last_tag(&self) -> Option<MessageTag> {
        self.last_tag
    }
}
