//! Log-distance path loss model
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn default_rssi_at_1m() -> f64 {
    -40.0
}

fn default_rssi_variance() -> f64 {
    4.0
}

/// [PathLossModel] converts a received signal strength to a distance to the emitter,
/// following the Log-Distance Path Loss model. Both parameters are empirical
/// and only approximate real world attenuation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathLossModel {
    /// Signal strength measured at 1 meter from the emitter (dBm)
    #[cfg_attr(feature = "serde", serde(default = "default_rssi_at_1m"))]
    pub rssi_at_1m_dbm: f64,
    /// Assumed variance of the RSSI measurements (dBm²)
    #[cfg_attr(feature = "serde", serde(default = "default_rssi_variance"))]
    pub rssi_variance_dbm2: f64,
}

impl Default for PathLossModel {
    fn default() -> Self {
        Self {
            rssi_at_1m_dbm: default_rssi_at_1m(),
            rssi_variance_dbm2: default_rssi_variance(),
        }
    }
}

impl PathLossModel {
    /// Copies and returns [PathLossModel] with updated RSSI variance (dBm²)
    pub fn with_rssi_variance(&self, variance_dbm2: f64) -> Self {
        let mut s = *self;
        s.rssi_variance_dbm2 = variance_dbm2;
        s
    }

    /// Estimated distance to the emitter (meters) for this `rssi` (dBm)
    /// and path loss exponent.
    pub fn distance(&self, rssi_dbm: f64, path_loss_exponent: f64) -> f64 {
        10.0_f64.powf((self.rssi_at_1m_dbm - rssi_dbm) / (10.0 * path_loss_exponent))
    }

    /// Variance (m²) of the [Self::distance] estimate, propagated from the
    /// RSSI variance with a first order approximation.
    pub fn distance_variance(&self, rssi_dbm: f64, path_loss_exponent: f64) -> f64 {
        let d = self.distance(rssi_dbm, path_loss_exponent);
        let factor = (10.0_f64.ln() / (10.0 * path_loss_exponent)) * d;
        factor * factor * self.rssi_variance_dbm2
    }
}
