use ambulance_drone::api::{
    DispatchController, RouteProvider, StaticRouteProvider, StraightLineProvider, TelemetryFormatter,
};
use ambulance_drone::utils::config::ConfigurationManager;
use ambulance_drone::validation::error::DispatchResult;
use std::path::PathBuf;
use tracing::info;

const USAGE: &str =
    "[--config <file>] [--hospital <id>] [--geometry <file>] [--realtime] [--json]";

/// Ticks between telemetry log lines
const TELEMETRY_LOG_INTERVAL: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    config_path: Option<PathBuf>,
    hospital_id: u32,
    geometry_path: Option<PathBuf>,
    realtime: bool,
    json: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            hospital_id: 1,
            geometry_path: None,
            realtime: false,
            json: false,
        }
    }
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config requires a file path")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "--hospital" => {
                let id = args.next().ok_or("--hospital requires an id")?;
                options.hospital_id = id
                    .parse()
                    .map_err(|_| format!("invalid hospital id '{}'", id))?;
            }
            "--geometry" => {
                let path = args.next().ok_or("--geometry requires a file path")?;
                options.geometry_path = Some(PathBuf::from(path));
            }
            "--realtime" => options.realtime = true,
            "--json" => options.json = true,
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    Ok(options)
}

/// Recorded directions responses start with `{`; anything else is a bare polyline
fn recorded_provider(content: &str) -> DispatchResult<StaticRouteProvider> {
    let content = content.trim();
    if content.starts_with('{') {
        StaticRouteProvider::from_directions_response(content)
    } else {
        Ok(StaticRouteProvider::new(content))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "ambulance-drone".to_string());
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Usage: {} {}", program, USAGE);
            return Err("Invalid arguments".into());
        }
    };

    let manager = match &options.config_path {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };
    let config = manager.config();

    let provider: Box<dyn RouteProvider> = match &options.geometry_path {
        Some(path) => match recorded_provider(&std::fs::read_to_string(path)?) {
            Ok(provider) => Box::new(provider),
            Err(e) => {
                eprintln!("{}", e.user_message());
                return Err(e.into());
            }
        },
        None => Box::new(StraightLineProvider::new(config.straight_line_steps)),
    };

    let mut controller = DispatchController::new(provider, config);
    let formatter = TelemetryFormatter::compact();

    let report = match controller.select_hospital(options.hospital_id) {
        Ok(report) => report.clone(),
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };
    for warning in &report.warnings {
        eprintln!("Route warning: {}", warning);
    }

    controller.deploy()?;

    let period = controller.tick_period();
    let mut ticks = 0u32;
    while controller.is_flying() {
        if options.realtime {
            std::thread::sleep(period);
        }
        ticks += controller.advance(period)?;
        if ticks % TELEMETRY_LOG_INTERVAL == 0 {
            info!("{}", formatter.format_text(&controller.telemetry()));
        }
    }

    let telemetry = controller.telemetry();
    info!(
        ticks,
        flight_time_s = (period * ticks).as_secs_f64(),
        "flight finished"
    );

    if options.json {
        println!("{}", TelemetryFormatter::new().format_json(&telemetry)?);
    } else {
        if let Some(hospital) = controller.selected_hospital() {
            println!("Destination: {} {}", hospital.name, hospital.position);
        }
        println!(
            "Route: {} waypoints, {:.2} km",
            report.waypoint_count, report.path_length_km
        );
        print!("{}", TelemetryFormatter::new().format_text(&telemetry));
    }

    Ok(())
}
