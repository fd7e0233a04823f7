//! Deterministic controller cycle: host service, then one engine tick.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to the configured core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`.
//!
//! ## Cycle Loop
//! With the `rt` feature the loop sleeps on `CLOCK_MONOTONIC` with
//! `TIMER_ABSTIME` and an overrun ends the run. Without it the loop paces
//! itself with `std::thread::sleep` and only counts overruns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use trajscan_common::engine::registers::Register;
use trajscan_common::engine::state::{EngineStatus, ErrorCode};

use crate::config::AppConfig;
use crate::engine::{TickOutcome, TrajectoryEngine};
use crate::error::ControlError;
use crate::host::{HostError, HostFeeder, PointSet};
use crate::servo::SimulatedServo;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    pub sum_cycle_ns: i64,
    /// Number of overruns detected.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns], 0 before the first cycle.
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors during RT setup or cycle execution.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("RT setup error: {0}")]
    RtSetup(String),

    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("control error: {0}")]
    Control(#[from] ControlError),

    #[error("cycle overrun: {actual_ns}ns > {budget_ns}ns budget")]
    CycleOverrun { actual_ns: i64, budget_ns: i64 },
}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{mlockall, MlockallFlags};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 1 MB of stack so the loop never takes a page fault on it.
fn prefault_stack() {
    let mut buf = [0u8; 1024 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusively borrowed stack location.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup sequence. No-op without the `rt` feature apart from the
/// stack prefault.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every point was sent and consumed.
    Completed,
    /// Shutdown was requested; the engine was parked with `Abort`.
    Aborted,
    /// The engine latched an error.
    Faulted(ErrorCode),
}

/// Final state of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reason: StopReason,
    pub status: EngineStatus,
    pub error: ErrorCode,
    pub total_points: u64,
    pub points_sent: u64,
    pub buffer_fills: u64,
    pub stats: CycleStats,
}

/// Drives a [`TrajectoryEngine`] against the simulated servo, servicing
/// the host feeder once per cycle.
pub struct CycleRunner {
    engine: TrajectoryEngine,
    servo: SimulatedServo,
    feeder: HostFeeder,
    running: Arc<AtomicBool>,
    stats: CycleStats,
    cycle_time_ns: i64,
    abort_sent: bool,
}

impl CycleRunner {
    /// Build the engine, prime both buffers and activate.
    pub fn new(config: &AppConfig, points: PointSet) -> Result<Self, CycleError> {
        points.check_max_velocities(&config.host.max_velocity)?;

        let mut engine = TrajectoryEngine::new(&config.engine);
        let servo = config.servo.build();
        let mut feeder = HostFeeder::new(points, config.host.total_points);
        feeder.prime(&mut engine)?;
        let status = engine.activate(&servo)?;
        info!(
            ?status,
            total_points = feeder.total_points(),
            buffer_length = engine.buffer_length(),
            "runner ready"
        );

        Ok(Self {
            engine,
            servo,
            feeder,
            running: Arc::new(AtomicBool::new(true)),
            stats: CycleStats::new(),
            cycle_time_ns: config.engine.cycle_time_us as i64 * 1000,
            abort_sent: false,
        })
    }

    /// Flag that ends the run when cleared.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    #[inline]
    pub fn engine(&self) -> &TrajectoryEngine {
        &self.engine
    }

    #[inline]
    pub fn servo(&self) -> &SimulatedServo {
        &self.servo
    }

    #[inline]
    pub fn servo_mut(&mut self) -> &mut SimulatedServo {
        &mut self.servo
    }

    #[inline]
    pub fn feeder(&self) -> &HostFeeder {
        &self.feeder
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn summary(&self, reason: StopReason) -> RunSummary {
        RunSummary {
            reason,
            status: self.engine.status(),
            error: self.engine.error_code(),
            total_points: self.engine.total_points(),
            points_sent: self.feeder.sent(),
            buffer_fills: self.feeder.fills(),
            stats: self.stats.clone(),
        }
    }

    /// Run until completion, fault or shutdown.
    pub fn run(&mut self) -> Result<RunSummary, CycleError> {
        #[cfg(feature = "rt")]
        let reason = self.run_rt_loop()?;

        #[cfg(not(feature = "rt"))]
        let reason = self.run_sim_loop()?;

        let summary = self.summary(reason);
        info!(
            reason = ?summary.reason,
            total_points = summary.total_points,
            cycles = summary.stats.cycle_count,
            overruns = summary.stats.overruns,
            "run finished"
        );
        Ok(summary)
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<StopReason, CycleError> {
        use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = |what: &str| {
            clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("{what}: {e}")))
        };
        let mut next_wake = now("clock_gettime")?;

        loop {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = now("clock_gettime")?;
            let wake_latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();

            let stop = self.step()?;

            let cycle_end = now("clock_gettime")?;
            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            self.stats.record(duration_ns, wake_latency_ns);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }
            if let Some(reason) = stop {
                return Ok(reason);
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) -> Result<StopReason, CycleError> {
        use std::time::{Duration, Instant};

        let cycle_duration = Duration::from_nanos(self.cycle_time_ns as u64);

        loop {
            let cycle_start = Instant::now();

            let stop = self.step()?;

            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;
            self.stats.record(duration_ns, 0);
            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
            }
            if let Some(reason) = stop {
                return Ok(reason);
            }

            if let Some(remaining) = cycle_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
    }

    /// One cycle without pacing: refill, then tick.
    pub fn step(&mut self) -> Result<Option<StopReason>, CycleError> {
        if !self.running.load(Ordering::Acquire) && !self.abort_sent {
            warn!("shutdown requested, raising abort");
            if self.engine.abort_requested() {
                self.engine.write(Register::Abort, 0)?;
            }
            self.engine.write(Register::Abort, 1)?;
            self.abort_sent = true;
        }

        if !self.abort_sent {
            self.feeder.service(&mut self.engine)?;
        }

        let outcome = self.engine.tick(&mut self.servo);
        Ok(match outcome {
            TickOutcome::Faulted(code) => Some(StopReason::Faulted(code)),
            TickOutcome::Inactive if self.engine.status() == EngineStatus::Error => {
                Some(StopReason::Faulted(self.engine.error_code()))
            }
            TickOutcome::Parked if self.abort_sent => Some(StopReason::Aborted),
            TickOutcome::Starved
            | TickOutcome::Consumed {
                exhausted: true, ..
            } if self.feeder.is_done() => Some(StopReason::Completed),
            _ => None,
        })
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// `a - b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
