//! Resource usage reporting for long-running table builds.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub phase_time: Duration,
    pub total_time: Duration,
    pub memory_mb: Option<u64>,
    pub peak_memory_mb: Option<u64>,
}

#[cfg(feature = "cli")]
struct ProcessProbe {
    system: System,
    pid: Pid,
    peak_mb: u64,
}

#[cfg(feature = "cli")]
impl ProcessProbe {
    fn new() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        Some(Self {
            system: System::new(),
            pid,
            peak_mb: 0,
        })
    }

    fn sample(&mut self) -> Option<(u64, u64)> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let memory_mb = self.system.process(self.pid)?.memory() / 1024 / 1024;
        self.peak_mb = self.peak_mb.max(memory_mb);
        Some((memory_mb, self.peak_mb))
    }
}

pub struct BuildMonitor {
    enabled: bool,
    started: Instant,
    phase_started: Mutex<Instant>,
    #[cfg(feature = "cli")]
    probe: Mutex<Option<ProcessProbe>>,
}

impl BuildMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            started: now,
            phase_started: Mutex::new(now),
            #[cfg(feature = "cli")]
            probe: Mutex::new(if enabled { ProcessProbe::new() } else { None }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Closes the current phase and returns its timing. Memory is only sampled
    /// when the `cli` feature is on.
    pub fn finish_phase(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }
        let now = Instant::now();
        let phase_time = {
            let mut started = self.phase_started.lock().ok()?;
            let elapsed = now.duration_since(*started);
            *started = now;
            elapsed
        };

        #[cfg(feature = "cli")]
        let memory = self
            .probe
            .lock()
            .ok()
            .and_then(|mut probe| probe.as_mut().and_then(ProcessProbe::sample));
        #[cfg(not(feature = "cli"))]
        let memory: Option<(u64, u64)> = None;

        Some(PhaseStats {
            phase: phase.to_string(),
            phase_time,
            total_time: now.duration_since(self.started),
            memory_mb: memory.map(|(current, _)| current),
            peak_memory_mb: memory.map(|(_, peak)| peak),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.finish_phase(phase) {
            match (stats.memory_mb, stats.peak_memory_mb) {
                (Some(mem), Some(peak)) => tracing::info!(
                    "📊 {} - took {:?}, Memory: {}MB, Peak: {}MB",
                    stats.phase,
                    stats.phase_time,
                    mem,
                    peak
                ),
                _ => tracing::info!("📊 {} - took {:?}", stats.phase, stats.phase_time),
            }
        }
    }

    pub fn log_final(&self) {
        if self.enabled {
            tracing::info!("📊 Total build time: {:?}", self.started.elapsed());
        }
    }
}

impl Default for BuildMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
