use crate::target::Target;

/// Name under which the health probe registers with the [`Monitor`].
///
/// [`Monitor`]: crate::monitor::Monitor
pub const HEALTH_PROBE_NAME: &str = "health_check";

/// Tri-state health verdict produced by a probe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthCode {
    /// Target looks healthy.
    #[default]
    Ok,
    /// Target reported itself damaged but is still running.
    NonFatalError,
    /// Target is gone.
    Crash,
}

impl HealthCode {
    /// The integer code the original campaign tooling exchanged:
    /// 0 = ok, -1 = non-fatal anomaly, -2 = crash.
    pub fn as_i32(self) -> i32 {
        match self {
            HealthCode::Ok => 0,
            HealthCode::NonFatalError => -1,
            HealthCode::Crash => -2,
        }
    }
}

/// One probe cycle's result: a [`HealthCode`] plus the raw feedback bytes
/// captured from the target. Rebuilt from scratch every cycle and handed out
/// by value; read-only once returned.
#[derive(Debug, Clone, Default)]
pub struct HealthStatus {
    code: HealthCode,
    feedback: Vec<u8>,
}

impl HealthStatus {
    pub fn new(code: HealthCode, feedback: Vec<u8>) -> Self {
        Self { code, feedback }
    }

    pub fn code(&self) -> HealthCode {
        self.code
    }

    pub fn feedback(&self) -> &[u8] {
        &self.feedback
    }
}

/// A target-health sampler driven by the host's monitor subsystem.
///
/// All probes in this crate are *blocking*: the host invokes [`Probe::sample`]
/// synchronously once per cycle and the cycle does not complete until it
/// returns. There is no internal concurrency and no retry logic; an
/// unreadable feedback channel is the target object's concern.
pub trait Probe: Send {
    /// Stable name the probe registers under.
    fn name(&self) -> &'static str;

    /// Arms the probe. Must not mutate the target.
    fn start(&mut self, target: &mut dyn Target);

    /// Disarms the probe. Most probes have nothing to tear down; this exists
    /// so the host can lifecycle every probe uniformly.
    fn stop(&mut self, target: &mut dyn Target);

    /// Samples the target once and returns a fresh status.
    fn sample(&mut self, target: &mut dyn Target) -> HealthStatus;
}

/// Polls a target's feedback channel and liveness/damage flags.
///
/// The damage check takes priority over the liveness check: a target that
/// reports itself damaged is classified [`HealthCode::NonFatalError`] even if
/// it is also no longer alive.
#[derive(Debug, Default)]
pub struct HealthMonitorProbe {
    status: HealthStatus,
}

impl HealthMonitorProbe {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Probe for HealthMonitorProbe {
    fn name(&self) -> &'static str {
        HEALTH_PROBE_NAME
    }

    fn start(&mut self, _target: &mut dyn Target) {
        self.status = HealthStatus::default();
    }

    fn stop(&mut self, _target: &mut dyn Target) {}

    fn sample(&mut self, target: &mut dyn Target) -> HealthStatus {
        let feedback = target.get_feedback();

        let code = if target.is_damaged() {
            HealthCode::NonFatalError
        } else if !target.is_alive() {
            HealthCode::Crash
        } else {
            HealthCode::Ok
        };

        self.status = HealthStatus::new(code, feedback);
        self.status.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Target whose flags and feedback are fixed up front.
    struct ScriptedTarget {
        alive: bool,
        damaged: bool,
        feedback: Vec<u8>,
        stop_calls: usize,
    }

    impl ScriptedTarget {
        fn new(alive: bool, damaged: bool, feedback: &[u8]) -> Self {
            Self {
                alive,
                damaged,
                feedback: feedback.to_vec(),
                stop_calls: 0,
            }
        }
    }

    impl Target for ScriptedTarget {
        fn name(&self) -> &'static str {
            "ScriptedTarget"
        }
        fn deliver(&mut self, _data: &[u8]) -> Result<(), crate::target::TargetError> {
            Ok(())
        }
        fn get_feedback(&mut self) -> Vec<u8> {
            self.feedback.clone()
        }
        fn is_alive(&mut self) -> bool {
            self.alive
        }
        fn is_damaged(&mut self) -> bool {
            self.damaged
        }
        fn stop(&mut self) {
            self.stop_calls += 1;
        }
    }

    #[test]
    fn healthy_target_samples_ok_with_feedback_payload() {
        let mut probe = HealthMonitorProbe::new();
        let mut target = ScriptedTarget::new(true, false, b"all quiet");
        probe.start(&mut target);

        let status = probe.sample(&mut target);
        assert_eq!(status.code(), HealthCode::Ok);
        assert_eq!(status.code().as_i32(), 0);
        assert_eq!(status.feedback(), b"all quiet");
    }

    #[test]
    fn damaged_target_samples_non_fatal_error() {
        let mut probe = HealthMonitorProbe::new();
        let mut target = ScriptedTarget::new(true, true, b"decode error");

        let status = probe.sample(&mut target);
        assert_eq!(status.code(), HealthCode::NonFatalError);
        assert_eq!(status.code().as_i32(), -1);
    }

    #[test]
    fn dead_target_samples_crash() {
        let mut probe = HealthMonitorProbe::new();
        let mut target = ScriptedTarget::new(false, false, b"");

        let status = probe.sample(&mut target);
        assert_eq!(status.code(), HealthCode::Crash);
        assert_eq!(status.code().as_i32(), -2);
    }

    #[test]
    fn damage_takes_priority_over_liveness() {
        let mut probe = HealthMonitorProbe::new();
        let mut target = ScriptedTarget::new(false, true, b"broken then gone");

        let status = probe.sample(&mut target);
        assert_eq!(
            status.code(),
            HealthCode::NonFatalError,
            "a damaged-but-dead target must be classified as non-fatal, not crash"
        );
    }

    #[test]
    fn start_resets_status_and_leaves_target_alone() {
        let mut probe = HealthMonitorProbe::new();
        let mut target = ScriptedTarget::new(false, true, b"x");
        probe.sample(&mut target);

        probe.start(&mut target);
        assert_eq!(probe.status.code(), HealthCode::Ok);
        assert!(probe.status.feedback().is_empty());
        assert_eq!(target.stop_calls, 0, "start must not touch the target");

        probe.stop(&mut target);
        assert_eq!(target.stop_calls, 0, "stop is a no-op on the target");
    }

    #[test]
    fn each_sample_rebuilds_the_status() {
        let mut probe = HealthMonitorProbe::new();
        let mut target = ScriptedTarget::new(true, true, b"first");
        let first = probe.sample(&mut target);
        assert_eq!(first.code(), HealthCode::NonFatalError);

        target.damaged = false;
        target.feedback = b"second".to_vec();
        let second = probe.sample(&mut target);
        assert_eq!(second.code(), HealthCode::Ok);
        assert_eq!(second.feedback(), b"second");
        // The previously returned status is untouched by the new cycle.
        assert_eq!(first.feedback(), b"first");
    }
}
