//! Radio environment: emitters, scans and positioning data sources
use hifitime::Epoch;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{candidate::Observation, position::GeoPoint};

/// [EmitterId] uniquely identifies a radio emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EmitterId {
    /// Wi-Fi access point, identified by its BSSID
    Wifi { bssid: [u8; 6] },
    /// Cellular base station
    Cell { mcc: u16, mnc: u16, area: u32, cell: u64 },
}

impl std::fmt::Display for EmitterId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Wifi { bssid } => write!(
                f,
                "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                bssid[0], bssid[1], bssid[2], bssid[3], bssid[4], bssid[5]
            ),
            Self::Cell {
                mcc,
                mnc,
                area,
                cell,
            } => write!(f, "{}-{}-{}-{}", mcc, mnc, area, cell),
        }
    }
}

/// Known location of an emitter, as provided by a [PositioningDataSource].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PositioningData {
    /// Latitude in decimal degrees
    pub latitude_deg: f64,
    /// Longitude in decimal degrees
    pub longitude_deg: f64,
    /// Horizontal accuracy (meters)
    pub accuracy_m: f64,
    /// Altitude (meters), when known
    pub altitude_m: Option<f64>,
    /// Vertical accuracy (meters), when known
    pub vertical_accuracy_m: Option<f64>,
}

impl std::fmt::Display for PositioningData {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{{{},{}±{}m",
            self.latitude_deg, self.longitude_deg, self.accuracy_m
        )?;
        if let Some(altitude_m) = self.altitude_m {
            write!(f, " altitude:{}", altitude_m)?;
            if let Some(accuracy_m) = self.vertical_accuracy_m {
                write!(f, "±{}", accuracy_m)?;
            }
            write!(f, "m")?;
        }
        write!(f, "}}")
    }
}

impl PositioningData {
    /// Builds new [PositioningData] without vertical component
    pub fn new(latitude_deg: f64, longitude_deg: f64, accuracy_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            accuracy_m,
            altitude_m: None,
            vertical_accuracy_m: None,
        }
    }

    /// Copies and returns [PositioningData] with altitude and vertical accuracy (meters)
    pub fn with_altitude(&self, altitude_m: f64, vertical_accuracy_m: f64) -> Self {
        let mut s = *self;
        s.altitude_m = Some(altitude_m);
        s.vertical_accuracy_m = Some(vertical_accuracy_m);
        s
    }

    /// Forms the [Observation] of this emitter, received at this signal strength (dBm)
    pub fn to_observation(&self, rssi_dbm: f64) -> Observation {
        let mut position = GeoPoint::new(self.latitude_deg, self.longitude_deg);
        position.altitude_m = self.altitude_m;

        let mut observation = Observation::new(position, self.accuracy_m, rssi_dbm);
        observation.vertical_accuracy_m = self.vertical_accuracy_m;
        observation
    }
}

/// One emitter seen during a radio scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanResult {
    /// Emitter
    pub id: EmitterId,
    /// Received signal strength (dBm)
    pub rssi_dbm: f64,
    /// Last time this emitter was seen
    pub timestamp: Epoch,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    #[error("scan failed: {0}")]
    Failure(String),
    #[error("scanner unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("fetch failed: {0}")]
    Failure(String),
    #[error("positioning data source unavailable")]
    Unavailable,
}

/// [RadioScanner] lists the emitters currently in range.
pub trait RadioScanner {
    /// Scans the radio environment. `scope` identifies the requester,
    /// on whose behalf the scan is performed.
    fn scan(&self, scope: &str) -> Result<Vec<ScanResult>, ScanError>;
}

/// [PositioningDataSource] knows where emitters are located.
/// A source may return more entries than requested, typically emitters located
/// nearby the requested ones. Emitters it does not know about may either be omitted
/// or returned without [PositioningData].
pub trait PositioningDataSource {
    fn fetch(&self, ids: &[EmitterId])
        -> Result<Vec<(EmitterId, Option<PositioningData>)>, FetchError>;
}

/// [LocationHost] consumes position fixes.
pub trait LocationHost {
    fn report(&self, fix: crate::reporting::Fix);
}
