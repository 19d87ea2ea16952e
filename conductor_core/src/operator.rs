use crate::engine::{EngineOps, OptionDescriptor, OptionValue};
use crate::monitor::{Monitor, MonitorError};
use crate::operation::{
    ActorId, ActorParams, CycleFeedback, ExportRequest, Instruction, InstructionFlag,
    LastInstruction,
};
use crate::probe::{HEALTH_PROBE_NAME, HealthCode};
use crate::target::Target;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Name of the fixed mutator paired with each primary-phase generator.
pub const TYPE_MUTATOR: &str = "TYPE";
/// Name of the fixed mutator paired with each secondary-phase generator.
pub const TERM_MUTATOR: &str = "TERM";
/// Platform display tool launched when no viewer path is configured.
pub const DEFAULT_VIEWER_PATH: &str = "/usr/bin/display";

/// Errors that can occur while lifecycling an operator.
#[derive(Error, Debug)]
pub enum OperatorError {
    /// The engine knows no generator sources, so there is nothing to step
    /// through. Starting anyway would leave the operator in undefined state.
    #[error("engine reported zero generator sources, cannot arm the operator")]
    NoGenerators,
    /// A monitor interaction failed (unknown or stopped probe).
    #[error("monitor interaction failed: {0}")]
    Monitor(#[from] MonitorError),
}

/// An `Operator` drives a fuzzing campaign one cycle at a time.
///
/// The host engine arms it with [`Operator::start`], then repeats: ask for
/// the next [`Instruction`], execute it, poll the monitor, and hand control
/// back through [`Operator::do_after_all`] for the post-cycle verdict. Calls
/// never overlap for one operator instance; the host enforces strict
/// per-cycle sequencing.
pub trait Operator: Send {
    /// Arms the operator against a target. Fails if preconditions do not
    /// hold; succeeds unconditionally once they do.
    fn start(
        &mut self,
        engine: &dyn EngineOps,
        target: &mut dyn Target,
        monitor: &mut Monitor,
    ) -> Result<(), OperatorError>;

    /// Tears the operator down at end of campaign.
    fn stop(&mut self, target: &mut dyn Target, monitor: &mut Monitor)
    -> Result<(), OperatorError>;

    /// Emits the next instruction. Deterministic given current state and the
    /// cycle feedback.
    fn plan_next_operation(&mut self, feedback: &CycleFeedback) -> Instruction;

    /// Post-cycle hook: inspects probe status and decides whether the
    /// just-executed test case gets exported and whether the target process
    /// survives into the next cycle.
    fn do_after_all(
        &mut self,
        target: &mut dyn Target,
        monitor: &Monitor,
    ) -> Result<LastInstruction, OperatorError>;
}

/// Phase layout of a [`SequencingOperator`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencingMode {
    /// Every step pairs the current generator with the TYPE mutator.
    #[default]
    SinglePhase,
    /// First half of the budget runs TYPE steps, second half TERM steps,
    /// each drawn against the same queue position via differently-tagged
    /// clones.
    TwoPhase,
}

/// Configuration for a [`SequencingOperator`].
#[derive(Debug, Clone)]
pub struct SequencingConfig {
    /// Model-walker start index, forwarded verbatim to the mutators.
    pub init: u32,
    /// Total instruction cycles before the operator stops the run.
    pub max_steps: u32,
    pub mode: SequencingMode,
    /// Executable override for process-based targets; ignored otherwise.
    pub path: PathBuf,
    /// Pause inserted after a data-maker change, throttling churn when
    /// generators exhaust quickly. Zero disables the pause.
    pub change_throttle: Duration,
}

impl Default for SequencingConfig {
    fn default() -> Self {
        Self {
            init: 1,
            max_steps: 20,
            mode: SequencingMode::SinglePhase,
            path: PathBuf::from(DEFAULT_VIEWER_PATH),
            change_throttle: Duration::from_secs(1),
        }
    }
}

/// Stateful driver that steps an ordered queue of generator sources against
/// a step budget, pairing each with a fixed mutator family per phase.
///
/// State machine: idle until [`start`] arms it, then stepping (primary, and
/// in [`SequencingMode::TwoPhase`] secondary) until the budget or the
/// generator queue runs out, after which every call yields a `Stop`
/// instruction. Queue exhaustion is the ordinary successful-completion path,
/// not an error.
///
/// [`start`]: Operator::start
pub struct SequencingOperator {
    config: SequencingConfig,
    primary_steps: u32,
    secondary_steps: u32,
    queue: VecDeque<String>,
    initial_count: usize,
    current_gen_id: Option<String>,
}

impl SequencingOperator {
    pub fn new(config: SequencingConfig) -> Self {
        Self {
            config,
            primary_steps: 0,
            secondary_steps: 0,
            queue: VecDeque::new(),
            initial_count: 0,
            current_gen_id: None,
        }
    }

    /// Configuration schema registered with the host at load time.
    pub fn option_schema() -> Vec<OptionDescriptor> {
        vec![
            OptionDescriptor {
                name: "init",
                description: "make the model walker ignore all the steps until the provided one",
                default: OptionValue::Int(1),
            },
            OptionDescriptor {
                name: "max_steps",
                description: "number of test cases to run",
                default: OptionValue::Int(20),
            },
            OptionDescriptor {
                name: "mode",
                description: "strategy mode (0 or 1)",
                default: OptionValue::Int(0),
            },
            OptionDescriptor {
                name: "path",
                description: "path of the target application (local viewer targets only)",
                default: OptionValue::Str(DEFAULT_VIEWER_PATH.to_string()),
            },
        ]
    }

    pub fn config(&self) -> &SequencingConfig {
        &self.config
    }

    /// Remaining (primary, secondary) step budget.
    pub fn remaining_steps(&self) -> (u32, u32) {
        (self.primary_steps, self.secondary_steps)
    }
}

impl Operator for SequencingOperator {
    fn start(
        &mut self,
        engine: &dyn EngineOps,
        target: &mut dyn Target,
        monitor: &mut Monitor,
    ) -> Result<(), OperatorError> {
        if let Some(process) = target.as_process() {
            process.set_path(self.config.path.clone());
        }

        // Two-phase mode splits the budget with floor division, so an odd
        // budget gives the secondary phase one step fewer than the primary.
        self.secondary_steps = match self.config.mode {
            SequencingMode::TwoPhase => self.config.max_steps / 2,
            SequencingMode::SinglePhase => 0,
        };
        self.primary_steps = self.config.max_steps - self.secondary_steps;

        let gen_ids = engine.known_generator_ids();
        if gen_ids.is_empty() {
            return Err(OperatorError::NoGenerators);
        }
        info!(generators = ?gen_ids, "generator sources discovered");

        self.initial_count = gen_ids.len();
        self.queue = VecDeque::from(gen_ids);
        self.current_gen_id = self.queue.pop_front();

        if target.as_process().is_some() {
            monitor.start_probe(HEALTH_PROBE_NAME, target)?;
        }
        Ok(())
    }

    fn stop(
        &mut self,
        target: &mut dyn Target,
        monitor: &mut Monitor,
    ) -> Result<(), OperatorError> {
        if target.as_process().is_some() {
            monitor.stop_probe(HEALTH_PROBE_NAME, target)?;
        }
        Ok(())
    }

    fn plan_next_operation(&mut self, feedback: &CycleFeedback) -> Instruction {
        if self.current_gen_id.is_none() {
            return Instruction::stop();
        }

        let mut instruction = Instruction::new();

        // Data-maker exhaustion is handled before anything else so that an
        // emptied queue stops the run regardless of remaining budget.
        if feedback.need_change() {
            match self.queue.pop_front() {
                Some(next) => {
                    self.current_gen_id = Some(next);
                    instruction.set_flag(InstructionFlag::CleanupDataMakers);
                }
                None => {
                    self.current_gen_id = None;
                    return Instruction::stop();
                }
            }
            for maker in feedback.exhausted() {
                info!(
                    index = maker.index,
                    kind = %maker.kind,
                    name = %maker.name,
                    "exhausted data maker"
                );
            }
            if !self.config.change_throttle.is_zero() {
                std::thread::sleep(self.config.change_throttle);
            }
        }

        let Some(current) = self.current_gen_id.clone() else {
            return Instruction::stop();
        };

        // Both tags are derived from queue state on every call; the primary
        // tag counts down with the queue while the secondary tag lives in a
        // disjoint range above `initial_count`, so no tag is ever reused
        // within a run.
        let remaining = self.queue.len() as u32;
        let primary_tag = remaining + 1;
        let secondary_tag = self.initial_count as u32 + remaining + 1;

        if self.primary_steps > 0 {
            instruction.push_action(ActorId::new(&current, primary_tag), ActorParams::finite());
            instruction.push_action(
                ActorId::new(TYPE_MUTATOR, primary_tag),
                ActorParams::with_init(self.config.init),
            );
            self.primary_steps -= 1;
        } else if self.config.mode == SequencingMode::TwoPhase && self.secondary_steps > 0 {
            instruction.push_action(ActorId::new(&current, secondary_tag), ActorParams::finite());
            instruction.push_action(
                ActorId::new(TERM_MUTATOR, secondary_tag),
                ActorParams::with_init(self.config.init),
            );
            self.secondary_steps -= 1;
        } else {
            return Instruction::stop();
        }

        instruction
    }

    fn do_after_all(
        &mut self,
        target: &mut dyn Target,
        monitor: &Monitor,
    ) -> Result<LastInstruction, OperatorError> {
        let mut verdict = LastInstruction::none();

        if target.as_process().is_some() {
            let status = monitor.probe_status(HEALTH_PROBE_NAME)?;
            verdict.set_target_feedback(status.feedback().to_vec());

            match status.code() {
                HealthCode::NonFatalError => {
                    verdict.set_export(ExportRequest::with_comment(
                        "This input has triggered an error, but not a crash!",
                    ));
                    target.stop();
                }
                HealthCode::Crash => {
                    // Leave the crashed process as-is for inspection.
                    verdict.set_export(ExportRequest::with_comment(
                        "This input has crashed the target!",
                    ));
                }
                HealthCode::Ok => {
                    // Fresh process per cycle when nothing happened.
                    target.stop();
                }
            }
        } else {
            // No health signal to filter on: keep everything.
            verdict.set_export(ExportRequest::new());
        }

        Ok(verdict)
    }
}
