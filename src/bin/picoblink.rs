#![no_std]
#![no_main]

use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_time::Timer;
use picoblink::{BlinkConfig, BlinkState, RpPlatform, Running};
use {defmt_rtt as _, panic_probe as _};

const RED_LED: u8 = 14;
const GREEN_LED: u8 = 15;
const BUTTON: u8 = 16;

static STATE: BlinkState = BlinkState::new();

#[embassy_executor::task]
async fn blink_service_task(running: Running<'static, RpPlatform>) {
    let report = running.run().await;
    info!("Blink service finished after {} presses", report.presses);
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    let platform = RpPlatform::new()
        .with_pin(RED_LED, p.PIN_14.into())
        .with_pin(GREEN_LED, p.PIN_15.into())
        .with_pin(BUTTON, p.PIN_16.into());

    let config = BlinkConfig {
        red_pin: RED_LED,
        green_pin: GREEN_LED,
        button_pin: BUTTON,
        ..Default::default()
    };

    match picoblink::start(platform, config, &STATE) {
        Ok(running) => {
            spawner.spawn(blink_service_task(running).expect("failed to spawn blink_service_task"));
        }
        Err(err) => error!("Blink service failed to start: {}", err),
    }

    loop {
        Timer::after_secs(10).await;
        let status = STATE.status();
        info!(
            "mode {} presses {} led {} write failures {}",
            status.mode, status.presses, status.led_on, status.write_failures
        );
    }
}
