use anyhow::Result;
use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver, Pull};

use control::InputEvent;

mod event;

pub use event::UserInputEvent;

// Decodes the rotary encoder and push button into discrete events. The
// poll cadence is the debounce: one edge is reported per poll and faster
// edges are dropped.
pub struct InputPoller<'d> {
    clk: PinDriver<'d, AnyIOPin, Input>,
    dt: PinDriver<'d, AnyIOPin, Input>,
    button: PinDriver<'d, AnyIOPin, Input>,
    clk_was_high: bool,
    button_was_high: bool,
}

impl<'d> InputPoller<'d> {
    pub fn new(clk: AnyIOPin, dt: AnyIOPin, button: AnyIOPin) -> Result<InputPoller<'d>> {
        let mut clk = PinDriver::input(clk)?;
        clk.set_pull(Pull::Up)?;
        let mut dt = PinDriver::input(dt)?;
        dt.set_pull(Pull::Up)?;
        let mut button = PinDriver::input(button)?;
        button.set_pull(Pull::Up)?;

        let clk_was_high = clk.is_high();
        let button_was_high = button.is_high();
        Ok(InputPoller {
            clk,
            dt,
            button,
            clk_was_high,
            button_was_high,
        })
    }

    pub fn poll(&mut self) -> Option<InputEvent> {
        let clk_high = self.clk.is_high();
        let dt_high = self.dt.is_high();
        let button_high = self.button.is_high();

        let mut event = None;

        // Falling CLK edge; DT carries the rotation direction
        if self.clk_was_high && !clk_high {
            event = Some(if dt_high {
                InputEvent::Next
            } else {
                InputEvent::Prev
            });
        }

        // Active-low button; a press outranks a simultaneous detent
        if self.button_was_high && !button_high {
            event = Some(InputEvent::Start);
        }

        self.clk_was_high = clk_high;
        self.button_was_high = button_high;
        event
    }
}
