//! Deep sleep and the hardware random source used for sleep jitter.

use aeris_core::DeepSleep;
use embassy_time::Duration;
use esp_hal::peripherals::LPWR;
use esp_hal::rng::Rng;
use esp_hal::rtc_cntl::Rtc;
use esp_hal::rtc_cntl::sleep::TimerWakeupSource;
use rand_core::{RngCore, impls};

/// RTC timer deep sleep. Waking resets the chip.
pub struct RtcDeepSleep<'d> {
    rtc: Rtc<'d>,
}

impl<'d> RtcDeepSleep<'d> {
    pub fn new(lpwr: LPWR<'d>) -> Self {
        Self {
            rtc: Rtc::new(lpwr),
        }
    }
}

impl DeepSleep for RtcDeepSleep<'_> {
    fn sleep_for(&mut self, duration: Duration) -> ! {
        let timer = TimerWakeupSource::new(core::time::Duration::from_micros(duration.as_micros()));
        self.rtc.sleep_deep(&[&timer])
    }
}

/// Hardware RNG exposed through `rand_core`.
///
/// Entropy is only fully random while the radio is running. That holds when
/// the sleep length is drawn after a send; if radio init failed the jitter
/// comes from the weaker pseudo-random source.
pub struct HardwareRng(Rng);

impl HardwareRng {
    pub fn new() -> Self {
        Self(Rng::new())
    }
}

impl Default for HardwareRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for HardwareRng {
    fn next_u32(&mut self) -> u32 {
        self.0.random()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
