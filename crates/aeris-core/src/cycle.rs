//! Wake cycle controller
//!
//! One controller runs per wake: it samples the sensors, brings up the radio,
//! sends the reading once, waits for the send to complete or time out, and
//! picks the next sleep length. There are no retries anywhere; every failure
//! leads straight to sleep and the next attempt is the next wake.
//!
//! ```text
//! Init -> Sampling -> RadioInit -> Sending -> AwaitingAck -> Sleeping
//!                         |                                    ^
//!                         +------------ init failed -----------+
//! ```

use core::convert::Infallible;
use core::future::pending;

use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Instant, with_deadline};
use heapless::Vec;
use log::{debug, error, info, warn};
use rand_core::RngCore;

use crate::config::NodeConfig;
use crate::radio::{AckSignal, RadioError, RadioTransport, SendStatus};
use crate::sensors::{BatteryMonitor, EnvironmentSensor, Sample, SensorReader};
use crate::sleep::{DeepSleep, compute_sleep_duration, enter_sleep};

/// Number of distinct phases in a cycle.
pub const MAX_PHASES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Init,
    Sampling,
    RadioInit,
    Sending,
    AwaitingAck,
    Sleeping,
}

impl CyclePhase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Sampling => "sampling",
            Self::RadioInit => "radio-init",
            Self::Sending => "sending",
            Self::AwaitingAck => "awaiting-ack",
            Self::Sleeping => "sleeping",
        }
    }
}

/// How the send part of a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The transport reported completion before the timeout.
    Acknowledged(SendStatus),
    /// No completion before the timeout; the reading may or may not have
    /// reached the receiver.
    SendTimeout,
    /// The radio could not be brought up, nothing was sent.
    RadioInitFailed(RadioError),
}

/// Everything that happened during one wake cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Phases in the order they were entered
    pub phases: Vec<CyclePhase, MAX_PHASES>,
    pub sample: Sample,
    pub outcome: CycleOutcome,
    /// Time from cycle start until the sleep decision
    pub awake: Duration,
    pub sleep: Duration,
}

impl CycleReport {
    pub fn send_attempted(&self) -> bool {
        self.phases.contains(&CyclePhase::Sending)
    }
}

/// Ordered record of the phases a cycle went through.
struct PhaseLog {
    phases: Vec<CyclePhase, MAX_PHASES>,
}

impl PhaseLog {
    fn new() -> Self {
        let mut phases = Vec::new();
        let _ = phases.push(CyclePhase::Init);
        Self { phases }
    }

    fn enter(&mut self, phase: CyclePhase) {
        if let Some(previous) = self.phases.last() {
            debug!("cycle: {} -> {}", previous.label(), phase.label());
        }
        // Each phase is entered at most once, so the log never overflows.
        let _ = self.phases.push(phase);
    }
}

/// Drives one wake cycle over borrowed hardware capabilities.
///
/// The controller is consumed by [`CycleController::run_cycle`], so a cycle
/// can produce at most one reading and issue at most one send.
pub struct CycleController<'a, S, B, T, R> {
    config: &'a NodeConfig,
    sensor: &'a mut S,
    battery: &'a mut B,
    radio: &'a mut T,
    rng: &'a mut R,
    ack: &'a AckSignal,
    cycle_start: Instant,
}

impl<'a, S, B, T, R> CycleController<'a, S, B, T, R>
where
    S: EnvironmentSensor,
    B: BatteryMonitor,
    T: RadioTransport,
    R: RngCore,
{
    /// Create a controller whose cycle starts now.
    pub fn new(
        config: &'a NodeConfig,
        sensor: &'a mut S,
        battery: &'a mut B,
        radio: &'a mut T,
        rng: &'a mut R,
        ack: &'a AckSignal,
    ) -> Self {
        Self {
            config,
            sensor,
            battery,
            radio,
            rng,
            ack,
            cycle_start: Instant::now(),
        }
    }

    /// Measure the send timeout from `start` instead of construction time,
    /// e.g. from boot when waking from deep sleep.
    pub fn starting_at(mut self, start: Instant) -> Self {
        self.cycle_start = start;
        self
    }

    /// Run the cycle up to the sleep decision.
    pub async fn run_cycle(self) -> CycleReport {
        let Self {
            config,
            sensor,
            battery,
            radio,
            rng,
            ack,
            cycle_start,
        } = self;
        let mut phases = PhaseLog::new();

        // Sample before the radio comes up so its heat does not bias the temperature.
        phases.enter(CyclePhase::Sampling);
        let sample = SensorReader::new(config)
            .read_environment(sensor, battery)
            .await;

        phases.enter(CyclePhase::RadioInit);
        info!("target mac: {}, channel: {}", config.peer, config.channel);

        let outcome = match radio.init(config.channel).await {
            Err(e) => {
                error!("*** ESP-NOW init failed: {}", e);
                CycleOutcome::RadioInitFailed(e)
            }
            Ok(()) => {
                match radio.local_address() {
                    Some(local) => info!("ESP-NOW init success, this mac: {}", local),
                    None => info!("ESP-NOW init success"),
                }
                if let Err(e) = radio.add_peer(&config.peer, config.channel) {
                    warn!("Peer registration failed, sending anyway: {}", e);
                }

                ack.reset();
                phases.enter(CyclePhase::Sending);
                let payload = sample.reading.to_bytes();
                let completion = radio.send(&config.peer, &payload);

                phases.enter(CyclePhase::AwaitingAck);
                let deadline = cycle_start + config.send_timeout;
                await_ack(ack, completion, deadline).await
            }
        };

        match outcome {
            CycleOutcome::Acknowledged(status) => info!("send done, status = {:?}", status),
            CycleOutcome::SendTimeout => warn!(
                "No send completion within {} ms",
                config.send_timeout.as_millis()
            ),
            CycleOutcome::RadioInitFailed(_) => {}
        }

        let sleep = compute_sleep_duration(config.base_sleep, config.max_jitter_secs, rng);
        phases.enter(CyclePhase::Sleeping);
        let awake = cycle_start.elapsed();
        info!(
            "Up for {} ms, going to sleep for {} secs...",
            awake.as_millis(),
            sleep.as_secs()
        );

        CycleReport {
            phases: phases.phases,
            sample,
            outcome,
            awake,
            sleep,
        }
    }

    /// Run the cycle and enter deep sleep. Never returns.
    pub async fn run<P: DeepSleep>(self, platform: &mut P) -> ! {
        let report = self.run_cycle().await;
        enter_sleep(platform, report.sleep)
    }
}

/// Wait until `ack` is set or `deadline` passes.
///
/// `completion` stands in for the transport's completion context: it is the
/// only writer of `ack`, and this function is its only reader.
async fn await_ack<F>(ack: &AckSignal, completion: F, deadline: Instant) -> CycleOutcome
where
    F: Future<Output = SendStatus>,
{
    let notify = async {
        ack.signal(completion.await);
        pending::<Infallible>().await
    };

    // The completion side is polled first so the send is issued even when
    // the deadline has already passed.
    match select(notify, with_deadline(deadline, ack.wait())).await {
        Either::First(never) => match never {},
        Either::Second(Ok(status)) => CycleOutcome::Acknowledged(status),
        Either::Second(Err(_)) => CycleOutcome::SendTimeout,
    }
}
