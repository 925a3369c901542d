use std::sync::{Arc, Mutex};

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::timer::EspTaskTimerService;
use log::*;

mod adc;
mod buzzer;
mod config;
mod display;
mod heating;
mod input;
mod measurement;

use adc::ThermistorInput;
use buzzer::{Buzzer, NoticeEvent};
use config::Config;
use control::Controller;
use display::{Lcd, StatusEvent};
use heating::{HeatingEvent, Ssr};
use input::{InputPoller, UserInputEvent};
use measurement::{MeasurementEvent, Sensor};

fn main() -> Result<()> {
    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    let peripherals = Peripherals::take().unwrap();
    let config = Config::read()?;

    let input = ThermistorInput::new(peripherals.adc1, peripherals.pins.gpio0)?;
    let mut sensor = Sensor::new(input, config.calibration, config.supply_mv);

    let mut ssr = Ssr::new(
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.pins.gpio3.into(),
    )?;

    let buzzer = Buzzer::start(
        peripherals.ledc.timer1,
        peripherals.ledc.channel1,
        peripherals.pins.gpio10.into(),
    )?;
    buzzer.play(buzzer::BOOT);

    let mut lcd = Lcd::new(
        peripherals.i2c0,
        peripherals.pins.gpio6.into(),
        peripherals.pins.gpio7.into(),
        100.kHz().into(),
    )?;
    lcd.init()?;

    let mut poller = InputPoller::new(
        peripherals.pins.gpio4.into(),
        peripherals.pins.gpio5.into(),
        peripherals.pins.gpio9.into(),
    )?;

    let controller = Arc::new(Mutex::new(Controller::new(config.core)));

    let sysloop = EspSystemEventLoop::take()?;
    let timer_service = EspTaskTimerService::new()?;

    let control_timer = {
        // Avoid move of sysloop into closure
        let localloop = sysloop.clone();
        timer_service.timer(move || {
            let temperature = sensor
                .read_temperature()
                .expect("Failed to read temperature");
            localloop
                .post::<MeasurementEvent>(&MeasurementEvent::Reading(temperature), delay::BLOCK)
                .expect("Failed to post measurement");
        })?
    };

    let _measurement_handler = {
        // Avoid move of sysloop into closure
        let localloop = sysloop.clone();
        let controller = controller.clone();
        sysloop.subscribe::<MeasurementEvent, _>(move |event| {
            let output = controller.lock().unwrap().control_tick(event.value());
            localloop
                .post::<HeatingEvent>(&HeatingEvent::new(output.duty), delay::BLOCK)
                .expect("Failed to post duty cycle");
            if let Some(notice) = output.notice {
                localloop
                    .post::<NoticeEvent>(&NoticeEvent(notice), delay::BLOCK)
                    .expect("Failed to post notice");
            }
        })?
    };

    let _heating_handler = sysloop.subscribe::<HeatingEvent, _>(move |event| {
        ssr.set_duty(event.duty()).expect("Failed to drive the relay");
    })?;

    let input_timer = {
        // Avoid move of sysloop into closure
        let localloop = sysloop.clone();
        timer_service.timer(move || {
            if let Some(event) = poller.poll() {
                localloop
                    .post::<UserInputEvent>(&UserInputEvent(event), delay::BLOCK)
                    .expect("Failed to post input event");
            }
        })?
    };

    let _input_handler = {
        // Avoid move of sysloop into closure
        let localloop = sysloop.clone();
        let controller = controller.clone();
        sysloop.subscribe::<UserInputEvent, _>(move |event| {
            info!("Received event {:?}", event);
            if let Some(notice) = controller.lock().unwrap().handle_input(event.value()) {
                localloop
                    .post::<NoticeEvent>(&NoticeEvent(notice), delay::BLOCK)
                    .expect("Failed to post notice");
            }
        })?
    };

    let display_timer = {
        // Avoid move of sysloop into closure
        let localloop = sysloop.clone();
        let controller = controller.clone();
        let period_s = config.display_interval.as_secs_f32();
        timer_service.timer(move || {
            let output = controller.lock().unwrap().presentation_tick(period_s);
            localloop
                .post::<StatusEvent>(&StatusEvent::Frame(output.frame), delay::BLOCK)
                .expect("Failed to post status frame");
            if let Some(notice) = output.notice {
                localloop
                    .post::<NoticeEvent>(&NoticeEvent(notice), delay::BLOCK)
                    .expect("Failed to post notice");
            }
        })?
    };

    let _status_handler = {
        let profile_names = config.profile_names.clone();
        sysloop.subscribe::<StatusEvent, _>(move |event| {
            lcd.render(&event.frame(), &profile_names)
                .expect("Failed to render status screen");
        })?
    };

    let _notice_handler = {
        let buzzer = buzzer.clone();
        sysloop.subscribe::<NoticeEvent, _>(move |event| {
            info!("Received event {:?}", event);
            buzzer.play(buzzer::sequence_for(event.value()));
        })?
    };

    control_timer.every(config.control_interval)?;
    input_timer.every(config.input_poll_interval)?;
    display_timer.every(config.display_interval)?;

    info!(
        "Controller ready with {} profiles",
        config.profile_names.len()
    );

    loop {
        // Everything runs off the timers and the event loop
        delay::FreeRtos::delay_ms(250);
    }
}
