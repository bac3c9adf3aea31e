use crate::config::GeofenceConfig;
use crate::error::GeoError;
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, info};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A device position in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Raw coordinate string format stored on attendance records
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// One-shot device position source. A single acquisition per gate check;
/// no cancellation token, no retries.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    async fn current_position(&self) -> Result<Position, GeoError>;
}

/// Position provider pinned at construction; stands in for a GPS sensor
/// on kiosk hardware installed at a fixed location.
pub struct FixedPositionProvider {
    position: Position,
    deny_permission: bool,
}

impl FixedPositionProvider {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position {
                latitude,
                longitude,
            },
            deny_permission: false,
        }
    }

    /// Simulate the operator declining the location permission prompt
    pub fn deny_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }
}

#[async_trait]
impl PositionProvider for FixedPositionProvider {
    async fn current_position(&self) -> Result<Position, GeoError> {
        if self.deny_permission {
            return Err(GeoError::PermissionDenied);
        }
        Ok(self.position)
    }
}

/// Great-circle distance between two positions in meters (haversine)
pub fn haversine_distance_m(a: Position, b: Position) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Gate decision. Out-of-radius is a verdict, not an error; sensor
/// failures surface as `GeoError` from `evaluate`.
#[derive(Debug, Clone, PartialEq)]
pub enum GateVerdict {
    Pass {
        position: Position,
        /// None when geofencing is disabled and no distance was computed
        distance_m: Option<f64>,
    },
    OutOfRange {
        position: Position,
        distance_m: f64,
    },
}

/// Compares a one-shot device position against the configured school
/// location and radius.
pub struct GeofenceGate {
    config: GeofenceConfig,
}

impl GeofenceGate {
    pub fn new(config: GeofenceConfig) -> Self {
        Self { config }
    }

    pub async fn evaluate(&self, provider: &dyn PositionProvider) -> Result<GateVerdict, GeoError> {
        let position = provider.current_position().await?;

        if !self.config.enabled {
            debug!("geofencing disabled; gate passes");
            return Ok(GateVerdict::Pass {
                position,
                distance_m: None,
            });
        }

        let center = Position {
            latitude: self.config.latitude,
            longitude: self.config.longitude,
        };
        let distance_m = haversine_distance_m(position, center);

        if distance_m <= self.config.radius_meters {
            info!(distance_m, radius_m = self.config.radius_meters, "inside geofence");
            Ok(GateVerdict::Pass {
                position,
                distance_m: Some(distance_m),
            })
        } else {
            info!(
                distance_m,
                radius_m = self.config.radius_meters,
                "outside geofence"
            );
            Ok(GateVerdict::OutOfRange {
                position,
                distance_m,
            })
        }
    }
}
