//! Timing and memory probes.
//!
//! The processor samples these around each split so the statistics engine
//! never touches the wall clock or the process heap itself.

use std::sync::Mutex;
use std::time::Instant;

/// Monotonic millisecond clock.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> f64;
}

/// Resident-memory sampler.
pub trait MemoryProbe: Send + Sync {
    /// Current resident memory in bytes, 0 when unknown.
    fn resident_bytes(&self) -> u64;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Reads `VmRSS` from `/proc/self/status`.
///
/// Returns 0 on platforms without procfs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMemoryProbe;

impl MemoryProbe for ProcessMemoryProbe {
    fn resident_bytes(&self) -> u64 {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|status| parse_vm_rss(&status))
            .unwrap_or(0)
    }
}

/// Extracts the `VmRSS` line (reported in kB) as bytes.
fn parse_vm_rss(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

/// Clock that advances by a fixed step on every read.
///
/// Makes elapsed times in reports exact and repeatable.
#[derive(Debug)]
pub struct StepClock {
    step_ms: f64,
    current: Mutex<f64>,
}

impl StepClock {
    /// Creates a clock starting at 0 that advances `step_ms` per read.
    #[must_use]
    pub const fn new(step_ms: f64) -> Self {
        Self {
            step_ms,
            current: Mutex::new(0.0),
        }
    }
}

impl Clock for StepClock {
    fn now_ms(&self) -> f64 {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = *current;
        *current += self.step_ms;
        now
    }
}

/// Memory probe that always reports the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedMemory(pub u64);

impl MemoryProbe for FixedMemory {
    fn resident_bytes(&self) -> u64 {
        self.0
    }
}
