use anyhow::Result;
use esp_idf_svc::hal::adc::attenuation::DB_11;
use esp_idf_svc::hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_svc::hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_svc::hal::adc::ADC1;
use esp_idf_svc::hal::gpio::Gpio0;

// The thermistor divider hangs off GPIO0 (ADC1 channel 0). Full
// attenuation so the divider midpoint stays inside the measurable range
// across the whole temperature span.
pub struct ThermistorInput<'d> {
    channel: AdcChannelDriver<'d, Gpio0, AdcDriver<'d, ADC1>>,
}

impl<'d> ThermistorInput<'d> {
    pub fn new(adc: ADC1, pin: Gpio0) -> Result<ThermistorInput<'d>> {
        let driver = AdcDriver::new(adc)?;
        let config = AdcChannelConfig {
            attenuation: DB_11,
            calibration: true,
            ..Default::default()
        };
        let channel = AdcChannelDriver::new(driver, pin, &config)?;
        Ok(ThermistorInput { channel })
    }

    pub fn read_millivolts(&mut self) -> Result<u16> {
        let value = self.channel.read()?;
        Ok(value)
    }
}
