use core::time::Duration;

use anyhow::{ensure, Context, Result};
use log::warn;
use serde::Deserialize;

use control::{CoreConfig, NtcCalibration, PidParameters, ThermalProfile, MAX_PROFILES};

#[toml_cfg::toml_config]
pub struct TomlConfig {
    #[default(50)]
    control_interval_ms: u64,
    #[default(500)]
    display_interval_ms: u64,
    #[default(10)]
    input_poll_interval_ms: u64,
    #[default(2.0)]
    pid_kp: f32,
    #[default(0.0025)]
    pid_ki: f32,
    #[default(9.0)]
    pid_kd: f32,
    #[default(0.0)]
    pid_output_min: f32,
    #[default(180.0)]
    pid_output_max: f32,
    #[default(40.0)]
    cooldown_exit_temperature: f32,
    #[default(0.0)]
    sensor_floor_temperature: f32,
    #[default(350.0)]
    sensor_ceiling_temperature: f32,
    #[default(3950.0)]
    ntc_beta: f32,
    #[default(87900.0)]
    ntc_nominal_resistance: f32,
    #[default(26.5)]
    ntc_nominal_temperature: f32,
    #[default(4700.0)]
    ntc_reference_resistance: f32,
    #[default(3300.0)]
    adc_supply_millivolts: f32,
}

// The selectable process curves ship with the firmware; there is no
// on-device profile editing.
static PROFILE_TABLE: &str = include_str!("../profiles.json");

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    name: String,
    #[serde(flatten)]
    profile: ThermalProfile,
}

pub struct Config {
    pub control_interval: Duration,
    pub display_interval: Duration,
    pub input_poll_interval: Duration,
    pub core: CoreConfig,
    pub calibration: NtcCalibration,
    pub supply_mv: f32,
    pub profile_names: Vec<String>,
}

impl Config {
    pub fn read() -> Result<Config> {
        Config::try_from(TOML_CONFIG)
    }
}

impl TryFrom<TomlConfig> for Config {
    type Error = anyhow::Error;

    fn try_from(config: TomlConfig) -> Result<Config> {
        let pid = PidParameters {
            kp: config.pid_kp,
            ki: config.pid_ki,
            kd: config.pid_kd,
            output_min: config.pid_output_min,
            output_max: config.pid_output_max,
        };
        pid.validate()?;

        let (profiles, profile_names) = load_profiles()?;

        Ok(Config {
            control_interval: Duration::from_millis(config.control_interval_ms),
            display_interval: Duration::from_millis(config.display_interval_ms),
            input_poll_interval: Duration::from_millis(config.input_poll_interval_ms),
            core: CoreConfig {
                profiles,
                pid,
                cooldown_exit_c: config.cooldown_exit_temperature,
                sensor_floor_c: config.sensor_floor_temperature,
                sensor_ceiling_c: config.sensor_ceiling_temperature,
            },
            calibration: NtcCalibration {
                beta: config.ntc_beta,
                nominal_resistance: config.ntc_nominal_resistance,
                nominal_temperature_c: config.ntc_nominal_temperature,
                reference_resistance: config.ntc_reference_resistance,
            },
            supply_mv: config.adc_supply_millivolts,
            profile_names,
        })
    }
}

fn load_profiles() -> Result<([Option<ThermalProfile>; MAX_PROFILES], Vec<String>)> {
    let entries: Vec<ProfileEntry> =
        serde_json::from_str(PROFILE_TABLE).context("Failed to parse the built-in profile table")?;

    let mut profiles = [None; MAX_PROFILES];
    let mut names = Vec::new();
    for entry in entries {
        if names.len() == MAX_PROFILES {
            warn!("Too many profiles configured; ignoring {}", entry.name);
            continue;
        }
        match entry.profile.validate() {
            Ok(()) => {
                profiles[names.len()] = Some(entry.profile);
                names.push(entry.name);
            }
            // A bad table entry loses its menu slot but never takes the
            // firmware down
            Err(error) => warn!("Rejecting profile {}: {}", entry.name, error),
        }
    }
    ensure!(!names.is_empty(), "No valid profiles configured");

    Ok((profiles, names))
}
