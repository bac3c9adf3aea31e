use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AbsensiConfig {
    pub school: SchoolConfig,
    pub geofence: GeofenceConfig,
    pub camera: CameraConfig,
    pub scanner: ScannerConfig,
    pub attendance: AttendanceConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchoolConfig {
    /// School display name, used in startup logs and receipts
    #[serde(default = "default_school_name")]
    pub name: String,

    /// National school identification number
    #[serde(default = "default_school_npsn")]
    pub npsn: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeofenceConfig {
    /// When false the gate passes without a distance check
    #[serde(default = "default_geofence_enabled")]
    pub enabled: bool,

    /// Latitude of the school location in degrees
    #[serde(default = "default_geofence_latitude")]
    pub latitude: f64,

    /// Longitude of the school location in degrees
    #[serde(default = "default_geofence_longitude")]
    pub longitude: f64,

    /// Allowed distance from the school location in meters
    #[serde(default = "default_geofence_radius")]
    pub radius_meters: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Requested capture resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Explicitly selected device id; None picks by facing preference
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScannerConfig {
    /// Frames wider than this are downscaled before decode
    #[serde(default = "default_max_decode_width")]
    pub max_decode_width: u32,

    /// Retry each frame with inverted bit polarity
    #[serde(default = "default_try_inverted")]
    pub try_inverted: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AttendanceConfig {
    /// Reject repeat scans of the same person within this window.
    /// Zero disables the check.
    #[serde(default = "default_duplicate_window_minutes")]
    pub duplicate_window_minutes: u32,

    /// Send a guardian notification after a successful check-in
    #[serde(default = "default_notify_present")]
    pub notify_present: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl AbsensiConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("absensi.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("school.name", default_school_name())?
            .set_default("school.npsn", default_school_npsn())?
            .set_default("geofence.enabled", default_geofence_enabled())?
            .set_default("geofence.latitude", default_geofence_latitude())?
            .set_default("geofence.longitude", default_geofence_longitude())?
            .set_default("geofence.radius_meters", default_geofence_radius())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("scanner.max_decode_width", default_max_decode_width())?
            .set_default("scanner.try_inverted", default_try_inverted())?
            .set_default(
                "attendance.duplicate_window_minutes",
                default_duplicate_window_minutes(),
            )?
            .set_default("attendance.notify_present", default_notify_present())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with ABSENSI_ prefix
            .add_source(Environment::with_prefix("ABSENSI").separator("_"))
            .build()?;

        let config: AbsensiConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.geofence.latitude) {
            return Err(ConfigError::Message(
                "Geofence latitude must be between -90 and 90 degrees".to_string(),
            ));
        }

        if !(-180.0..=180.0).contains(&self.geofence.longitude) {
            return Err(ConfigError::Message(
                "Geofence longitude must be between -180 and 180 degrees".to_string(),
            ));
        }

        if self.geofence.radius_meters < 0.0 || !self.geofence.radius_meters.is_finite() {
            return Err(ConfigError::Message(
                "Geofence radius must be a non-negative number of meters".to_string(),
            ));
        }

        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.scanner.max_decode_width == 0 {
            return Err(ConfigError::Message(
                "Scanner max_decode_width must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for AbsensiConfig {
    fn default() -> Self {
        Self {
            school: SchoolConfig {
                name: default_school_name(),
                npsn: default_school_npsn(),
            },
            geofence: GeofenceConfig {
                enabled: default_geofence_enabled(),
                latitude: default_geofence_latitude(),
                longitude: default_geofence_longitude(),
                radius_meters: default_geofence_radius(),
            },
            camera: CameraConfig {
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                device_id: None,
            },
            scanner: ScannerConfig {
                max_decode_width: default_max_decode_width(),
                try_inverted: default_try_inverted(),
            },
            attendance: AttendanceConfig {
                duplicate_window_minutes: default_duplicate_window_minutes(),
                notify_present: default_notify_present(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

// Default value functions
fn default_school_name() -> String {
    "YAYASAN DARULHUDA".to_string()
}
fn default_school_npsn() -> String {
    "12345678".to_string()
}

fn default_geofence_enabled() -> bool {
    true
}
fn default_geofence_latitude() -> f64 {
    -6.2
}
fn default_geofence_longitude() -> f64 {
    106.816666
}
fn default_geofence_radius() -> f64 {
    500.0
}

fn default_camera_resolution() -> (u32, u32) {
    (1280, 720)
}
fn default_camera_fps() -> u32 {
    30
}

fn default_max_decode_width() -> u32 {
    480
}
fn default_try_inverted() -> bool {
    true
}

fn default_duplicate_window_minutes() -> u32 {
    0
}
fn default_notify_present() -> bool {
    true
}

fn default_event_bus_capacity() -> usize {
    64
}
