use absensi::{
    AbsensiConfig, CheckInKiosk, CheckInOutcome, EventBus, FixedPositionProvider, KioskEvent,
    MemoryStore, SyntheticCamera, WhatsappMock,
};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "absensi")]
#[command(about = "QR and geofence based school attendance check-in kiosk")]
#[command(version)]
#[command(long_about = "Runs one attendance check-in session: verifies the device is \
inside the configured school geofence, opens a camera stream, decodes a QR scan code, \
and records the attendance entry. Ships with a synthetic camera backend that renders \
the given code, so the full pipeline runs without camera hardware.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "absensi.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without running a session")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Scan code fed to the synthetic camera
    #[arg(long, default_value = "2024001", help = "Scan code the synthetic camera renders as a QR frame")]
    code: String,

    /// JSON seed file with students and teachers
    #[arg(long, value_name = "FILE", help = "Load person records from a JSON seed file instead of the built-in roster")]
    seed: Option<PathBuf>,

    /// Explicit camera device id
    #[arg(long, value_name = "ID", help = "Select a camera device id instead of the facing preference")]
    device: Option<String>,

    /// Simulated device latitude (defaults to the geofence center)
    #[arg(long, help = "Device latitude reported by the position provider")]
    lat: Option<f64>,

    /// Simulated device longitude (defaults to the geofence center)
    #[arg(long, help = "Device longitude reported by the position provider")]
    lng: Option<f64>,

    /// Check in via the face tab instead of QR
    #[arg(long, help = "Run a face-capture session for the given code instead of a QR scan")]
    face: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting absensi kiosk v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match AbsensiConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }
    config.validate()?;

    info!(
        school = %config.school.name,
        npsn = %config.school.npsn,
        "configuration loaded and validated"
    );

    let store = match &args.seed {
        Some(path) => Arc::new(MemoryStore::from_seed_file(path)?),
        None => Arc::new(MemoryStore::default_roster()),
    };

    let position = Arc::new(FixedPositionProvider::new(
        args.lat.unwrap_or(config.geofence.latitude),
        args.lng.unwrap_or(config.geofence.longitude),
    ));

    let backend = Arc::new(SyntheticCamera::with_code(&args.code)?);

    let events = Arc::new(EventBus::new(config.system.event_bus_capacity));
    let mut event_rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            match &event {
                KioskEvent::GateBlocked { reason } => info!("gate blocked: {}", reason),
                other => info!(event_type = other.event_type(), "kiosk event"),
            }
        }
    });

    let mut kiosk = CheckInKiosk::new(
        config,
        position,
        backend,
        store.clone(),
        Arc::new(WhatsappMock),
        events,
    );

    if args.device.is_some() {
        kiosk.select_device(args.device.clone());
    }

    let outcome = if args.face {
        kiosk.run_face_session(&args.code).await?
    } else {
        kiosk.run_qr_session().await?
    };

    match outcome {
        CheckInOutcome::Recorded(receipt) => {
            println!(
                "✓ {} checked in at {} (record {})",
                receipt.person_name,
                receipt.recorded_at.format("%H:%M:%S"),
                receipt.record_id
            );
            Ok(())
        }
        CheckInOutcome::OutOfRange { distance_m } => {
            eprintln!("✗ Outside the school area ({:.0} m from the school)", distance_m);
            std::process::exit(1);
        }
        CheckInOutcome::Rejected { code, reason } => {
            eprintln!("✗ Scan rejected for code {}: {}", code, reason);
            std::process::exit(1);
        }
        CheckInOutcome::Cancelled => {
            eprintln!("✗ Session cancelled before a scan completed");
            std::process::exit(1);
        }
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("absensi={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer().with_target(true).boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Absensi Configuration File");
    println!("# Default configuration with all available options");
    println!();
    println!("{}", toml::to_string_pretty(&AbsensiConfig::default())?);
    Ok(())
}
