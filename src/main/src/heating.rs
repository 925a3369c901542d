use anyhow::Result;
use esp_idf_svc::hal::gpio::AnyOutputPin;
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution, CHANNEL0, TIMER0};
use esp_idf_svc::hal::prelude::*;
use log::info;

use control::OFF_DUTY;

mod event;

pub use event::HeatingEvent;

// Slow PWM is plenty for a solid-state relay switching a resistive load
const SSR_PWM_FREQUENCY_HZ: u32 = 500;

pub struct Ssr<'d> {
    channel: LedcDriver<'d>,
    driving: bool,
}

impl<'d> Ssr<'d> {
    pub fn new(timer: TIMER0, channel: CHANNEL0, pin: AnyOutputPin) -> Result<Ssr<'d>> {
        let timer_driver = LedcTimerDriver::new(
            timer,
            &TimerConfig::default()
                .frequency(SSR_PWM_FREQUENCY_HZ.Hz())
                .resolution(Resolution::Bits8),
        )?;
        let mut channel = LedcDriver::new(channel, timer_driver, pin)?;

        // The relay input is active-low; park it at the off value before
        // the control loop starts driving it.
        let max_duty = channel.get_max_duty();
        channel.set_duty(max_duty)?;

        Ok(Ssr {
            channel,
            driving: false,
        })
    }

    pub fn set_duty(&mut self, duty: u8) -> Result<()> {
        let max_duty = self.channel.get_max_duty();
        let scaled = u32::from(duty) * max_duty / u32::from(OFF_DUTY);
        self.channel.set_duty(scaled)?;

        let driving = duty < OFF_DUTY;
        if driving != self.driving {
            if driving {
                info!("Turning on heating output");
            } else {
                info!("Turning off heating output");
            }
            self.driving = driving;
        }
        Ok(())
    }
}
