use micromath::F32Ext;

static KELVIN_OFFSET: f32 = 273.15;

// NTC beta-equation calibration. Defaults match the thermistor glued to
// the hot plate: 87.9 kOhm at 26.5 degC, beta 3950, read through a
// 4.7 kOhm divider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NtcCalibration {
    pub beta: f32,
    pub nominal_resistance: f32,
    pub nominal_temperature_c: f32,
    pub reference_resistance: f32,
}

impl Default for NtcCalibration {
    fn default() -> Self {
        NtcCalibration {
            beta: 3950.0,
            nominal_resistance: 87_900.0,
            nominal_temperature_c: 26.5,
            reference_resistance: 4_700.0,
        }
    }
}

// Divider with the NTC on the low side and the reference resistor to the
// supply; the measured voltage is across the NTC.
pub fn resistance_from_voltage(calibration: &NtcCalibration, supply_mv: f32, measured_mv: f32) -> f32 {
    if measured_mv <= 0.0 {
        // Open input reads as a dead short: zero resistance, which the
        // beta equation maps to an implausibly cold reading.
        return 0.0;
    }
    if measured_mv >= supply_mv {
        return f32::MAX;
    }
    calibration.reference_resistance * measured_mv / (supply_mv - measured_mv)
}

pub fn temperature_from_resistance(calibration: &NtcCalibration, r2: f32) -> f32 {
    //                     1
    // t2 =  ------------------------------
    //           ln(rNtc / r1)        1
    //           -------------   +  ----
    //               beta            t1

    if r2 <= 0.0 {
        return -KELVIN_OFFSET;
    }

    let r1 = calibration.nominal_resistance;

    if r1 == r2 {
        return calibration.nominal_temperature_c;
    }

    let t1 = calibration.nominal_temperature_c + KELVIN_OFFSET;

    let resistance_ratio = r2 / r1;

    let t2 = 1.0 / ((resistance_ratio.ln() / calibration.beta) + (1.0 / t1));

    t2 - KELVIN_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_at_nominal_resistance() {
        let calibration = NtcCalibration::default();
        let t2 = temperature_from_resistance(&calibration, 87_900.0);
        assert_eq!(t2, 26.5);
    }

    #[test]
    fn test_temperature_near_nominal() {
        let calibration = NtcCalibration::default();

        let t2 = temperature_from_resistance(&calibration, 87_950.0);
        assert!(t2 < 26.5);
        assert!(t2 > 26.4);

        let t2 = temperature_from_resistance(&calibration, 87_850.0);
        assert!(t2 > 26.5);
        assert!(t2 < 26.6);
    }

    #[test]
    fn test_temperature_at_reflow_range() {
        let calibration = NtcCalibration::default();

        // Beta equation puts ~6.55 kOhm at the boiling point
        let t2 = temperature_from_resistance(&calibration, 6_556.0);
        assert!(t2 > 99.5, "{:?}", t2);
        assert!(t2 < 100.5, "{:?}", t2);
    }

    #[test]
    fn test_shorted_sensor_reads_implausibly_cold() {
        let calibration = NtcCalibration::default();
        let t2 = temperature_from_resistance(&calibration, 0.0);
        assert!(t2 < -270.0);
    }

    #[test]
    fn test_resistance_at_half_supply() {
        let calibration = NtcCalibration::default();
        let r2 = resistance_from_voltage(&calibration, 3300.0, 1650.0);
        assert_eq!(r2, calibration.reference_resistance);
    }

    #[test]
    fn test_resistance_monotonic_in_voltage() {
        let calibration = NtcCalibration::default();
        let low = resistance_from_voltage(&calibration, 3300.0, 500.0);
        let high = resistance_from_voltage(&calibration, 3300.0, 2500.0);
        assert!(low < high);
    }

    #[test]
    fn test_resistance_at_rail_voltages() {
        let calibration = NtcCalibration::default();
        assert_eq!(resistance_from_voltage(&calibration, 3300.0, 0.0), 0.0);
        assert_eq!(resistance_from_voltage(&calibration, 3300.0, 3300.0), f32::MAX);
    }
}
