use anyhow::Result;

use control::{resistance_from_voltage, temperature_from_resistance, NtcCalibration};

use crate::adc::ThermistorInput;

mod event;

pub use event::MeasurementEvent;

// Matches the smoothing depth of the analog front end this replaces
const SMOOTHING_WINDOW: usize = 5;

pub struct Sensor<'d> {
    input: ThermistorInput<'d>,
    calibration: NtcCalibration,
    supply_mv: f32,
    window: [f32; SMOOTHING_WINDOW],
    filled: usize,
    cursor: usize,
}

impl<'d> Sensor<'d> {
    pub fn new(input: ThermistorInput<'d>, calibration: NtcCalibration, supply_mv: f32) -> Sensor<'d> {
        Sensor {
            input,
            calibration,
            supply_mv,
            window: [0.0; SMOOTHING_WINDOW],
            filled: 0,
            cursor: 0,
        }
    }

    pub fn read_temperature(&mut self) -> Result<f32> {
        let measured_mv = f32::from(self.input.read_millivolts()?);
        let resistance = resistance_from_voltage(&self.calibration, self.supply_mv, measured_mv);
        let temperature = temperature_from_resistance(&self.calibration, resistance);
        Ok(self.smooth(temperature))
    }

    // Moving average over the last few conversions. A disconnected or
    // shorted sensor converts to an implausible temperature, which the
    // average still reports quickly enough for the plausibility guard.
    fn smooth(&mut self, sample: f32) -> f32 {
        self.window[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % SMOOTHING_WINDOW;
        if self.filled < SMOOTHING_WINDOW {
            self.filled += 1;
        }
        self.window[..self.filled].iter().sum::<f32>() / self.filled as f32
    }
}
