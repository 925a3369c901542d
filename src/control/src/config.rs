use anyhow::{ensure, Result};
use serde::Deserialize;

// Upper bound on selectable profiles; the menu wraps at the number
// actually configured.
pub const MAX_PROFILES: usize = 4;

// One thermal process curve: ramp towards the preheat target, hold the
// soak plateau, step up to the peak, cut off at the total duration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ThermalProfile {
    pub preheat_target_c: f32,
    pub soak_target_c: f32,
    pub peak_target_c: f32,
    pub soak_end_s: f32,
    pub peak_end_s: f32,
    pub total_duration_s: f32,
    pub ramp_rate_c_per_s: f32,
}

impl ThermalProfile {
    // Time boundaries must be strictly ordered. Temperature ordering is
    // deliberately not checked: phase changes are driven by elapsed time,
    // so any target ordering still terminates.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.soak_end_s > 0.0, "soak end must be positive");
        ensure!(
            self.soak_end_s < self.peak_end_s,
            "soak must end before the peak window"
        );
        ensure!(
            self.peak_end_s < self.total_duration_s,
            "peak window must end before the total duration"
        );
        ensure!(self.ramp_rate_c_per_s > 0.0, "ramp rate must be positive");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PidParameters {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    // Bounds on the summed correction term, not on the duty cycle.
    pub output_min: f32,
    pub output_max: f32,
}

impl PidParameters {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.output_min <= self.output_max,
            "output minimum must not exceed output maximum"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CoreConfig {
    pub profiles: [Option<ThermalProfile>; MAX_PROFILES],
    pub pid: PidParameters,
    // Temperature below which the plate is safe to touch again
    pub cooldown_exit_c: f32,
    // Plausibility window for the sensor reading while heating
    pub sensor_floor_c: f32,
    pub sensor_ceiling_c: f32,
}

impl CoreConfig {
    pub fn profile_count(&self) -> usize {
        self.profiles.iter().filter(|slot| slot.is_some()).count()
    }

    // Selection index 0 means "nothing selected"; profiles start at 1.
    pub fn profile(&self, selected: usize) -> Option<ThermalProfile> {
        if selected == 0 {
            return None;
        }
        self.profiles.get(selected - 1).copied().flatten()
    }
}
