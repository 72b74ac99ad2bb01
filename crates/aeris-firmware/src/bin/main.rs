#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use aeris_core::{AckSignal, CycleController};
use aeris_firmware::config::NODE_CONFIG;
use aeris_firmware::hardware::create_i2c_bus;
use aeris_firmware::power::{HardwareRng, RtcDeepSleep};
use aeris_firmware::radio::EspNowRadio;
use aeris_firmware::sensors::{AdcBattery, Bme280Sensor};
use embassy_executor::Spawner;
use embassy_time::Instant;
use esp_hal::clock::CpuClock;
use esp_hal::rtc_cntl::{reset_reason, wakeup_cause};
use esp_hal::system::Cpu;
use esp_hal::timer::timg::TimerGroup;
use log::info;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!(log::LevelFilter::Info);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-radio requires an allocator.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!(
        "Wake: reset_reason={:?} wakeup_cause={:?}",
        reset_reason(Cpu::ProCpu),
        wakeup_cause()
    );

    let i2c = create_i2c_bus(peripherals.I2C0, peripherals.GPIO8, peripherals.GPIO9)
        .expect("Failed to configure I2C bus");

    let mut sensor = Bme280Sensor::new(i2c);
    let mut battery = AdcBattery::new(peripherals.ADC1, peripherals.GPIO1);
    let mut radio = EspNowRadio::new(peripherals.WIFI);
    let mut rng = HardwareRng::new();
    let mut sleep = RtcDeepSleep::new(peripherals.LPWR);

    // Signalled by the cycle controller when the ESP-NOW send future resolves.
    let send_ack = AckSignal::new();

    // Every wake is a fresh boot, so the send timeout counts from reset.
    CycleController::new(
        &NODE_CONFIG,
        &mut sensor,
        &mut battery,
        &mut radio,
        &mut rng,
        &send_ack,
    )
    .starting_at(Instant::from_ticks(0))
    .run(&mut sleep)
    .await
}
