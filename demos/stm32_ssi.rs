//! Basic example for STM32 with Embassy
//!
//! This example demonstrates how to poll the AS5045 over bit-banged SSI
//! from an Embassy task on an STM32 microcontroller.
//!
//! Hardware setup:
//! - AS5045 CSn=PA4, CLK=PA5, DO=PA6
//! - 1 kHz polling loop

#![no_std]
#![no_main]

use as5045_ssi::{As5045, Clock, Config, Direction};
use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_time::{Delay, Instant, Timer};
use {defmt_rtt as _, panic_probe as _};

struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_micros(&mut self) -> u32 {
        // Truncation gives the wrapping counter the driver expects
        Instant::now().as_micros() as u32
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_stm32::init(Default::default());

    let cs = Output::new(p.PA4, Level::High, Speed::VeryHigh);
    let clk = Output::new(p.PA5, Level::High, Speed::VeryHigh);
    let data = Input::new(p.PA6, Pull::None);

    let config = Config {
        direction: Direction::Ccw,
        ..Config::default()
    };
    let mut sensor = As5045::new(cs, clk, data, Delay, EmbassyClock, config);

    unwrap!(sensor.init());
    match sensor.diagnostics() {
        Ok(diag) if !diag.is_valid() => warn!("Sensor not ready: {}", diag),
        Ok(_) => {}
        Err(e) => error!("Sensor error: {:?}", e),
    }

    let removed = unwrap!(sensor.calibrate_relative_zero());
    info!("AS5045 zeroed, removed {} rad", removed);

    loop {
        let velocity = unwrap!(sensor.velocity());
        let angle = sensor.tracker().previous_angle();
        info!("Angle: {} rad, velocity: {} rad/s", angle, velocity);

        Timer::after_millis(1).await;
    }
}
