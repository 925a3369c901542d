use anyhow::Result;
use esp_idf_svc::hal::delay::{self, Ets, FreeRtos};
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::i2c::{I2c, I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::units::Hertz;

use control::{Mode, StatusFrame, OFF_DUTY};

mod event;

pub use event::StatusEvent;

// 16x2 HD44780 behind the usual PCF8574 backpack
const LCD_ADDRESS: u8 = 0x27;

const BACKLIGHT: u8 = 0x08;
const ENABLE: u8 = 0x04;
const REGISTER_SELECT: u8 = 0x01;

pub struct Lcd<'d> {
    driver: I2cDriver<'d>,
    address: u8,
}

impl<'d> Lcd<'d> {
    pub fn new(
        i2c: impl Peripheral<P = impl I2c> + 'd,
        sda: AnyIOPin,
        scl: AnyIOPin,
        baudrate: Hertz,
    ) -> Result<Lcd<'d>> {
        let config = I2cConfig::new().baudrate(baudrate);
        let driver = I2cDriver::new(i2c, sda, scl, &config)?;
        Ok(Lcd {
            driver,
            address: LCD_ADDRESS,
        })
    }

    // Standard HD44780 power-on dance into 4-bit mode
    pub fn init(&mut self) -> Result<()> {
        FreeRtos::delay_ms(50);
        self.write_nibble(0x30)?;
        FreeRtos::delay_ms(5);
        self.write_nibble(0x30)?;
        Ets::delay_us(150);
        self.write_nibble(0x30)?;
        Ets::delay_us(150);
        self.write_nibble(0x20)?;

        self.command(0x28)?; // two lines, 5x8 font
        self.command(0x0C)?; // display on, cursor off
        self.command(0x06)?; // entry mode: increment, no shift
        self.clear()?;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.command(0x01)?;
        FreeRtos::delay_ms(2);
        Ok(())
    }

    pub fn set_cursor(&mut self, row: u8, column: u8) -> Result<()> {
        let base = if row == 0 { 0x80 } else { 0xC0 };
        self.command(base + column)
    }

    pub fn print(&mut self, text: &str) -> Result<()> {
        for byte in text.bytes() {
            self.write_byte(byte, true)?;
        }
        Ok(())
    }

    fn command(&mut self, value: u8) -> Result<()> {
        self.write_byte(value, false)
    }

    fn write_byte(&mut self, value: u8, data: bool) -> Result<()> {
        let select = if data { REGISTER_SELECT } else { 0 };
        self.write_nibble((value & 0xF0) | select)?;
        self.write_nibble(((value << 4) & 0xF0) | select)?;
        Ok(())
    }

    fn write_nibble(&mut self, value: u8) -> Result<()> {
        let value = value | BACKLIGHT;
        self.driver
            .write(self.address, &[value | ENABLE], delay::BLOCK)?;
        Ets::delay_us(50);
        self.driver.write(self.address, &[value], delay::BLOCK)?;
        Ets::delay_us(50);
        Ok(())
    }

    pub fn render(&mut self, frame: &StatusFrame, profile_names: &[String]) -> Result<()> {
        self.clear()?;

        self.set_cursor(0, 0)?;
        self.print(&format!("T: {:.1}", frame.temperature_c))?;
        self.set_cursor(0, 9)?;
        let driving = frame.mode == Mode::Running && frame.duty < OFF_DUTY;
        self.print(if driving { "SSR ON" } else { "SSR OFF" })?;

        self.set_cursor(1, 0)?;
        match frame.mode {
            Mode::Idle if frame.fault => self.print("  SENSOR FAULT  ")?,
            Mode::Idle => {
                let name = frame
                    .selected
                    .checked_sub(1)
                    .and_then(|index| profile_names.get(index));
                match name {
                    Some(name) => self.print(name)?,
                    None => self.print("Select Mode")?,
                }
            }
            Mode::Running => {
                self.print(&format!("S{:.0}", frame.setpoint_c))?;
                self.set_cursor(1, 5)?;
                self.print(&format!("PWM{}", frame.duty))?;
                self.set_cursor(1, 12)?;
                self.print(&format!("{:.0}s", frame.elapsed_s))?;
            }
            Mode::Completed => self.print("REFLOW COMPLETED")?,
            Mode::Cooldown => self.print("    COOLDOWN    ")?,
        }
        Ok(())
    }
}
