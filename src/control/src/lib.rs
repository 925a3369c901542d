#![no_std]

mod config;
mod state;
mod thermistor;

pub use config::{CoreConfig, PidParameters, ThermalProfile, MAX_PROFILES};
pub use state::{
    ControlOutput, Controller, InputEvent, Mode, Notice, PresentationOutput, StatusFrame, OFF_DUTY,
};
pub use thermistor::{resistance_from_voltage, temperature_from_resistance, NtcCalibration};

// Target temperature for the current instant of a run. Rules are checked
// in priority order and the first match wins:
//   1. below the preheat target, follow the open-loop ramp from zero
//   2. preheated and inside the soak window, hold the soak plateau
//   3. inside the peak window, hold the peak target
// Past the peak window there is no rule; the caller keeps its previous
// setpoint and relies on the duration cutoff to finish the run.
//
// The ramp is a pure function of elapsed time and is not clamped at the
// preheat target, so it can overshoot it slightly before the temperature
// gate flips over to the plateau.
pub fn profile_target(profile: &ThermalProfile, elapsed_s: f32, temperature_c: f32) -> Option<f32> {
    if temperature_c < profile.preheat_target_c {
        return Some(elapsed_s * profile.ramp_rate_c_per_s);
    }
    if elapsed_s < profile.soak_end_s {
        return Some(profile.soak_target_c);
    }
    if elapsed_s < profile.peak_end_s {
        return Some(profile.peak_target_c);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ThermalProfile {
        ThermalProfile {
            preheat_target_c: 140.0,
            soak_target_c: 150.0,
            peak_target_c: 200.0,
            soak_end_s: 90.0,
            peak_end_s: 110.0,
            total_duration_s: 130.0,
            ramp_rate_c_per_s: 1.666,
        }
    }

    #[test]
    fn test_ramp_below_preheat_target() {
        let target = profile_target(&profile(), 60.0, 130.0).unwrap();
        assert!(target > 99.95, "{:?}", target);
        assert!(target < 99.97, "{:?}", target);
    }

    #[test]
    fn test_ramp_is_non_decreasing() {
        let profile = profile();
        let mut previous = 0.0;
        for tick in 0..180 {
            let elapsed = tick as f32 * 0.5;
            let target = profile_target(&profile, elapsed, 120.0).unwrap();
            assert!(target >= previous, "{:?} at {:?}s", target, elapsed);
            previous = target;
        }
    }

    #[test]
    fn test_ramp_is_not_clamped_at_preheat_target() {
        // A slow-heating plate keeps the ramp formula active well past
        // the point where it exceeds the preheat target
        let target = profile_target(&profile(), 100.0, 130.0).unwrap();
        assert!(target > 140.0, "{:?}", target);
    }

    #[test]
    fn test_ramp_wins_over_peak_window() {
        // Rule priority: a cold plate follows the ramp even inside the
        // peak window
        let target = profile_target(&profile(), 100.0, 100.0).unwrap();
        assert!(target > 166.59, "{:?}", target);
        assert!(target < 166.61, "{:?}", target);
    }

    #[test]
    fn test_soak_plateau_once_preheated() {
        let profile = profile();
        assert_eq!(profile_target(&profile, 45.0, 145.0), Some(150.0));
        assert_eq!(profile_target(&profile, 80.0, 145.0), Some(150.0));
        assert_eq!(profile_target(&profile, 89.9, 155.0), Some(150.0));
    }

    #[test]
    fn test_peak_window() {
        let profile = profile();
        assert_eq!(profile_target(&profile, 90.0, 150.0), Some(200.0));
        assert_eq!(profile_target(&profile, 100.0, 160.0), Some(200.0));
        assert_eq!(profile_target(&profile, 109.9, 195.0), Some(200.0));
    }

    #[test]
    fn test_no_rule_past_peak_window() {
        let profile = profile();
        assert_eq!(profile_target(&profile, 110.0, 200.0), None);
        assert_eq!(profile_target(&profile, 125.0, 185.0), None);
    }

    #[test]
    fn test_boundary_reading_flips_between_ramp_and_plateau() {
        // The gate is the raw temperature comparison, so a noisy reading
        // around the preheat target alternates between the two rules
        let profile = profile();
        assert_eq!(
            profile_target(&profile, 60.0, 139.9),
            Some(60.0 * profile.ramp_rate_c_per_s)
        );
        assert_eq!(profile_target(&profile, 60.0, 140.0), Some(150.0));
    }
}
