use std::sync::mpsc;
use std::thread;

use anyhow::Result;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::AnyOutputPin;
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, CHANNEL1, TIMER1};
use esp_idf_svc::hal::prelude::*;
use log::warn;

use control::Notice;

mod event;

pub use event::NoticeEvent;

#[derive(Debug, Clone, Copy)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

impl Tone {
    const fn note(frequency_hz: u32, duration_ms: u32) -> Tone {
        Tone {
            frequency_hz,
            duration_ms,
        }
    }

    const fn rest(duration_ms: u32) -> Tone {
        Tone {
            frequency_hz: 0,
            duration_ms,
        }
    }
}

pub const BOOT: &[Tone] = &[Tone::note(1800, 200)];
const SELECT: &[Tone] = &[Tone::note(2300, 40)];
const START: &[Tone] = &[
    Tone::note(2000, 150),
    Tone::note(2200, 150),
    Tone::note(2400, 150),
];
const CANCEL: &[Tone] = &[
    Tone::note(2500, 150),
    Tone::note(2200, 150),
    Tone::note(2000, 150),
];
const COMPLETED: &[Tone] = &[Tone::note(1800, 1000)];
const COOLED: &[Tone] = &[Tone::note(1000, 100)];
const ALARM: &[Tone] = &[
    Tone::note(400, 300),
    Tone::rest(100),
    Tone::note(400, 300),
];

pub fn sequence_for(notice: Notice) -> &'static [Tone] {
    match notice {
        Notice::SelectionChanged => SELECT,
        Notice::Started => START,
        Notice::Cancelled => CANCEL,
        Notice::Completed => COMPLETED,
        Notice::CooledDown => COOLED,
        Notice::ProfileRejected | Notice::SensorFault => ALARM,
    }
}

// Tones play from their own thread so the control loop never waits on
// the speaker.
#[derive(Clone)]
pub struct Buzzer {
    queue: mpsc::Sender<Tone>,
}

impl Buzzer {
    pub fn start(timer: TIMER1, channel: CHANNEL1, pin: AnyOutputPin) -> Result<Buzzer> {
        let (queue, playback) = mpsc::channel::<Tone>();
        thread::Builder::new()
            .name("buzzer".into())
            .stack_size(4096)
            .spawn(move || Buzzer::playback(timer, channel, pin, playback))?;
        Ok(Buzzer { queue })
    }

    pub fn play(&self, tones: &[Tone]) {
        for tone in tones {
            // A send only fails when the playback thread is gone, and a
            // silent chirp is not worth surfacing
            let _ = self.queue.send(*tone);
        }
    }

    fn playback(
        mut timer: TIMER1,
        mut channel: CHANNEL1,
        mut pin: AnyOutputPin,
        playback: mpsc::Receiver<Tone>,
    ) {
        for tone in playback {
            if tone.frequency_hz == 0 {
                FreeRtos::delay_ms(tone.duration_ms);
                continue;
            }
            if let Err(error) = Buzzer::sound(&mut timer, &mut channel, &mut pin, tone) {
                warn!("Buzzer tone failed: {}", error);
            }
        }
    }

    // The LEDC timer is reprogrammed per note; dropping the drivers
    // silences the pin again.
    fn sound(
        timer: &mut TIMER1,
        channel: &mut CHANNEL1,
        pin: &mut AnyOutputPin,
        tone: Tone,
    ) -> Result<()> {
        let timer_driver = LedcTimerDriver::new(
            &mut *timer,
            &TimerConfig::default().frequency(tone.frequency_hz.Hz()),
        )?;
        let mut pwm = LedcDriver::new(&mut *channel, timer_driver, &mut *pin)?;
        let half = pwm.get_max_duty() / 2;
        pwm.set_duty(half)?;
        FreeRtos::delay_ms(tone.duration_ms);
        pwm.set_duty(0)?;
        Ok(())
    }
}
