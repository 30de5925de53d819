pub mod almanac;
pub mod bit_info;
pub mod ephemeris;
pub mod ionosphere;
pub mod pvt;
pub mod raw_obs;
pub mod utc_time;

pub use almanac::{GlonassAlmanac, GpsAlmanac};
pub use ephemeris::{ura_index, GlonassEphemeris, GpsEphemeris};
pub use ionosphere::IonosphereParameters;
pub use pvt::{Pvt, PvtFlags};
pub use raw_obs::{Observation, Signal};
pub use utc_time::UtcParameters;
