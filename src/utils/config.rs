//! Configuration management
//!
//! Loads and saves `SimulationConfig` as JSON and validates every parameter
//! before it is applied.

use crate::api::types::TraversalConfig;
use crate::core::{
    Coordinate, Hospital, AMBULANCE_START, BATTERY_DECREMENT_PER_TICK, FULL_BATTERY_PERCENT,
    LOW_BATTERY_THRESHOLD_PERCENT, TICK_PERIOD_MS,
};
use crate::validation::data::RouteValidationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Simulation-wide configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Launch point of the drone
    pub origin: Coordinate,
    /// Tick period (milliseconds)
    pub tick_period_ms: u64,
    /// Battery drained per tick (%)
    pub battery_decrement_per_tick: f64,
    /// Battery charge of a freshly loaded drone (%)
    pub initial_battery_percent: f64,
    /// Battery charge below which telemetry is flagged (%)
    pub low_battery_threshold_percent: f64,
    /// Legs generated by the offline straight-line route provider
    pub straight_line_steps: usize,
    pub route_validation: RouteValidationConfig,
    /// Selectable destinations
    pub hospitals: Vec<Hospital>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            origin: AMBULANCE_START,
            tick_period_ms: TICK_PERIOD_MS,
            battery_decrement_per_tick: BATTERY_DECREMENT_PER_TICK,
            initial_battery_percent: FULL_BATTERY_PERCENT,
            low_battery_threshold_percent: LOW_BATTERY_THRESHOLD_PERCENT,
            straight_line_steps: 40,
            route_validation: RouteValidationConfig::default(),
            hospitals: default_hospitals(),
        }
    }
}

impl SimulationConfig {
    pub fn traversal_config(&self) -> TraversalConfig {
        TraversalConfig {
            initial_battery_percent: self.initial_battery_percent,
            battery_decrement_per_tick: self.battery_decrement_per_tick,
        }
    }

    pub fn hospital(&self, id: u32) -> Option<&Hospital> {
        self.hospitals.iter().find(|h| h.id == id)
    }
}

/// Hospitals reachable from the default staging point
pub fn default_hospitals() -> Vec<Hospital> {
    vec![
        Hospital::new(1, "City Hospital", Coordinate::new(28.560000, 77.140000)),
        Hospital::new(2, "General Hospital", Coordinate::new(28.545000, 77.120000)),
        Hospital::new(3, "Trauma Center", Coordinate::new(28.570000, 77.150000)),
    ]
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("I/O error: {message}")]
    Io { message: String },
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl ConfigError {
    fn invalid(parameter: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

/// Owns the active configuration and its backing file
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    config: SimulationConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a configuration manager with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replace the configuration if it validates
    pub fn update_config(&mut self, config: SimulationConfig) -> Result<(), ConfigError> {
        Self::ensure_valid(Self::validate_config(&config))?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("failed to read config file '{}': {}", path_str, e),
        })?;

        let config: SimulationConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Serialization {
                message: format!("failed to parse config file '{}': {}", path_str, e),
            })?;

        let validation = Self::validate_config(&config);
        for warning in &validation.warnings {
            warn!(path = %path_str, "{}", warning);
        }
        Self::ensure_valid(validation)?;

        info!(path = %path_str, hospitals = config.hospitals.len(), "configuration loaded");
        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content =
            serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::Serialization {
                message: format!("failed to serialize config: {}", e),
            })?;

        fs::write(&path, content).map_err(|e| ConfigError::Io {
            message: format!("failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::Io {
                message: "no file path set for saving configuration".to_string(),
            }),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Update the tick period, returning the previous value
    pub fn set_tick_period(&mut self, tick_period_ms: u64) -> Result<u64, ConfigError> {
        if tick_period_ms == 0 {
            return Err(ConfigError::invalid(
                "tick_period_ms",
                tick_period_ms,
                "tick period must be at least 1 ms",
            ));
        }

        let old_value = self.config.tick_period_ms;
        self.config.tick_period_ms = tick_period_ms;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Update the per-tick battery drain, returning the previous value
    pub fn set_battery_decrement(&mut self, decrement: f64) -> Result<f64, ConfigError> {
        if !(decrement > 0.0 && decrement <= 100.0) {
            return Err(ConfigError::invalid(
                "battery_decrement_per_tick",
                decrement,
                "battery decrement must be in (0, 100]",
            ));
        }

        let old_value = self.config.battery_decrement_per_tick;
        self.config.battery_decrement_per_tick = decrement;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Add a hospital to the catalog; ids must be unique
    pub fn add_hospital(&mut self, hospital: Hospital) -> Result<(), ConfigError> {
        if self.config.hospital(hospital.id).is_some() {
            return Err(ConfigError::invalid(
                "hospitals",
                hospital.id,
                "hospital id already in use",
            ));
        }
        if !hospital.position.is_valid() {
            return Err(ConfigError::invalid(
                "hospitals",
                hospital.position,
                "hospital position is not a valid coordinate",
            ));
        }

        self.config.hospitals.push(hospital);
        self.is_modified = true;
        Ok(())
    }

    pub fn hospital(&self, id: u32) -> Option<&Hospital> {
        self.config.hospital(id)
    }

    pub fn traversal_config(&self) -> TraversalConfig {
        self.config.traversal_config()
    }

    /// Validate a configuration without applying it
    pub fn validate_config(config: &SimulationConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if !config.origin.is_valid() {
            errors.push(ConfigError::invalid(
                "origin",
                config.origin,
                "origin is not a valid coordinate",
            ));
        }

        if config.tick_period_ms == 0 {
            errors.push(ConfigError::invalid(
                "tick_period_ms",
                config.tick_period_ms,
                "tick period must be at least 1 ms",
            ));
        } else if config.tick_period_ms > 1000 {
            warnings.push("Tick period above one second makes the flight look frozen".to_string());
        }

        let decrement = config.battery_decrement_per_tick;
        if !(decrement > 0.0 && decrement <= 100.0) {
            errors.push(ConfigError::invalid(
                "battery_decrement_per_tick",
                decrement,
                "battery decrement must be in (0, 100]",
            ));
        }

        let battery = config.initial_battery_percent;
        if !(battery > 0.0 && battery <= 100.0) {
            errors.push(ConfigError::invalid(
                "initial_battery_percent",
                battery,
                "initial battery must be in (0, 100]",
            ));
        }

        if !(0.0..=100.0).contains(&config.low_battery_threshold_percent) {
            errors.push(ConfigError::invalid(
                "low_battery_threshold_percent",
                config.low_battery_threshold_percent,
                "threshold must be in [0, 100]",
            ));
        } else if config.low_battery_threshold_percent >= battery {
            warnings.push("Low-battery warning is active from take-off".to_string());
        }

        if config.straight_line_steps == 0 {
            errors.push(ConfigError::invalid(
                "straight_line_steps",
                config.straight_line_steps,
                "at least one leg is required",
            ));
        }

        let route = &config.route_validation;
        if !(route.max_leg_km > 0.0) || !(route.max_origin_offset_km >= 0.0) {
            errors.push(ConfigError::invalid(
                "route_validation",
                format!("{}/{}", route.max_leg_km, route.max_origin_offset_km),
                "route validation limits must be positive",
            ));
        }

        if config.hospitals.is_empty() {
            warnings.push("Hospital catalog is empty; no destination can be selected".to_string());
        }
        for (i, hospital) in config.hospitals.iter().enumerate() {
            if config.hospitals[..i].iter().any(|h| h.id == hospital.id) {
                errors.push(ConfigError::invalid(
                    "hospitals",
                    hospital.id,
                    "hospital id already in use",
                ));
            }
            if !hospital.position.is_valid() {
                errors.push(ConfigError::invalid(
                    "hospitals",
                    hospital.position,
                    "hospital position is not a valid coordinate",
                ));
            }
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn ensure_valid(validation: ValidationResult) -> Result<(), ConfigError> {
        match validation.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
