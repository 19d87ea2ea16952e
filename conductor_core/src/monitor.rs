use crate::probe::{HealthStatus, Probe};
use crate::target::Target;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during monitor operations.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// No probe was registered under the requested name.
    #[error("no probe registered under name '{0}'")]
    UnknownProbe(String),
    /// The probe exists but has not been started, so it has no status.
    #[error("probe '{0}' is not running, no status available")]
    ProbeNotRunning(String),
}

struct ProbeSlot {
    probe: Box<dyn Probe>,
    running: bool,
    last_status: Option<HealthStatus>,
}

/// Registry and per-cycle driver for [`Probe`]s.
///
/// Probes are registered explicitly at campaign-assembly time; there is no
/// process-wide registry. The host calls [`Monitor::poll`] once per cycle,
/// after the cycle's instruction has executed and before the operator's
/// post-cycle hook, so that every running probe observes the feedback that
/// instruction produced.
#[derive(Default)]
pub struct Monitor {
    probes: HashMap<&'static str, ProbeSlot>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a probe under its own name. Re-registering a name replaces the
    /// previous probe.
    pub fn register(&mut self, probe: Box<dyn Probe>) {
        self.probes.insert(
            probe.name(),
            ProbeSlot {
                probe,
                running: false,
                last_status: None,
            },
        );
    }

    pub fn start_probe(&mut self, name: &str, target: &mut dyn Target) -> Result<(), MonitorError> {
        let slot = self
            .probes
            .get_mut(name)
            .ok_or_else(|| MonitorError::UnknownProbe(name.to_string()))?;
        slot.probe.start(target);
        slot.running = true;
        // Status starts out as ok until the first poll overwrites it.
        slot.last_status = Some(HealthStatus::default());
        Ok(())
    }

    pub fn stop_probe(&mut self, name: &str, target: &mut dyn Target) -> Result<(), MonitorError> {
        let slot = self
            .probes
            .get_mut(name)
            .ok_or_else(|| MonitorError::UnknownProbe(name.to_string()))?;
        slot.probe.stop(target);
        slot.running = false;
        slot.last_status = None;
        Ok(())
    }

    /// Samples every running probe once, blocking until each returns.
    pub fn poll(&mut self, target: &mut dyn Target) {
        for slot in self.probes.values_mut() {
            if slot.running {
                slot.last_status = Some(slot.probe.sample(target));
            }
        }
    }

    /// The most recent status of a running probe.
    pub fn probe_status(&self, name: &str) -> Result<HealthStatus, MonitorError> {
        let slot = self
            .probes
            .get(name)
            .ok_or_else(|| MonitorError::UnknownProbe(name.to_string()))?;
        slot.last_status
            .clone()
            .ok_or_else(|| MonitorError::ProbeNotRunning(name.to_string()))
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.probes.get(name).is_some_and(|slot| slot.running)
    }
}
