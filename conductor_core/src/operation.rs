use std::fmt;

/// Identifies one engine-side data maker invocation: a logical generator or
/// mutator name plus a 1-based clone tag.
///
/// The engine instantiates a fresh clone of a data maker per distinct tag, so
/// repeated invocations of the same logical id across a run stay isolated
/// from each other. Rendered as `name#tag` on the wire towards the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorId {
    name: String,
    clone_tag: u32,
}

impl ActorId {
    pub fn new(name: impl Into<String>, clone_tag: u32) -> Self {
        Self {
            name: name.into(),
            clone_tag,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clone_tag(&self) -> u32 {
        self.clone_tag
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.clone_tag)
    }
}

/// Parameters handed to a data maker alongside its [`ActorId`].
///
/// Only the fields the operator actually sets are modeled; everything else is
/// left to engine-side defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorParams {
    /// Constrain the data maker to a finite (non-infinite) sequence.
    pub finite: Option<bool>,
    /// Index into the generation-step sequence at which the model walker
    /// stops ignoring steps. Passed through verbatim, never interpreted here.
    pub init: Option<u32>,
}

impl ActorParams {
    /// Parameters requesting a finite sequence.
    pub fn finite() -> Self {
        Self {
            finite: Some(true),
            init: None,
        }
    }

    /// Parameters carrying a model-walker start index.
    pub fn with_init(init: u32) -> Self {
        Self {
            finite: None,
            init: Some(init),
        }
    }
}

/// Control flag attached to an [`Instruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstructionFlag {
    /// Ordinary cycle, nothing special for the engine to do.
    #[default]
    Continue,
    /// The engine must reset per-data-maker state before the next cycle.
    CleanupDataMakers,
    /// Terminal: the run is over, no actions carried.
    Stop,
}

/// The operator's per-cycle directive to the engine: which data makers to
/// invoke, with which parameters, plus a control flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instruction {
    actions: Vec<(ActorId, ActorParams)>,
    flag: InstructionFlag,
}

impl Instruction {
    pub fn new() -> Self {
        Self::default()
    }

    /// A terminal instruction carrying no actions.
    pub fn stop() -> Self {
        Self {
            actions: Vec::new(),
            flag: InstructionFlag::Stop,
        }
    }

    pub fn push_action(&mut self, actor: ActorId, params: ActorParams) {
        self.actions.push((actor, params));
    }

    pub fn set_flag(&mut self, flag: InstructionFlag) {
        self.flag = flag;
    }

    pub fn flag(&self) -> InstructionFlag {
        self.flag
    }

    pub fn actions(&self) -> &[(ActorId, ActorParams)] {
        &self.actions
    }

    pub fn is_stop(&self) -> bool {
        self.flag == InstructionFlag::Stop
    }
}

/// An engine-side data maker that ran out of data during the last cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExhaustedDataMaker {
    /// Position of the data maker in the engine's chain.
    pub index: usize,
    /// Data maker family, e.g. a generator or mutator type name.
    pub kind: String,
    /// Concrete data maker name.
    pub name: String,
}

/// Feedback the engine hands to the operator at the start of each cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleFeedback {
    need_change: bool,
    exhausted: Vec<ExhaustedDataMaker>,
}

impl CycleFeedback {
    /// Feedback for an uneventful cycle: nothing exhausted, no change needed.
    pub fn quiet() -> Self {
        Self::default()
    }

    /// Feedback signaling that the listed data makers are exhausted and the
    /// operator should move on to its next generation source.
    pub fn change_needed(exhausted: Vec<ExhaustedDataMaker>) -> Self {
        Self {
            need_change: true,
            exhausted,
        }
    }

    pub fn need_change(&self) -> bool {
        self.need_change
    }

    pub fn exhausted(&self) -> &[ExhaustedDataMaker] {
        &self.exhausted
    }
}

/// Request to persist the test case that was just executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    pub comment: Option<String>,
}

impl ExportRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
        }
    }
}

/// The operator's post-cycle verdict: whether to export the artifact, plus
/// any raw feedback captured from the target during the cycle.
#[derive(Debug, Clone, Default)]
pub struct LastInstruction {
    export: Option<ExportRequest>,
    target_feedback: Option<Vec<u8>>,
}

impl LastInstruction {
    /// A verdict requesting nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn set_export(&mut self, request: ExportRequest) {
        self.export = Some(request);
    }

    pub fn set_target_feedback(&mut self, feedback: Vec<u8>) {
        self.target_feedback = Some(feedback);
    }

    pub fn export(&self) -> Option<&ExportRequest> {
        self.export.as_ref()
    }

    pub fn target_feedback(&self) -> Option<&[u8]> {
        self.target_feedback.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_id_renders_name_and_clone_tag() {
        let actor = ActorId::new("g_jpg", 3);
        assert_eq!(actor.to_string(), "g_jpg#3");
        assert_eq!(actor.name(), "g_jpg");
        assert_eq!(actor.clone_tag(), 3);
    }

    #[test]
    fn stop_instruction_is_terminal_and_empty() {
        let instruction = Instruction::stop();
        assert!(instruction.is_stop());
        assert!(
            instruction.actions().is_empty(),
            "a stop instruction must not carry actions"
        );
    }

    #[test]
    fn default_instruction_continues() {
        let mut instruction = Instruction::new();
        assert_eq!(instruction.flag(), InstructionFlag::Continue);
        instruction.push_action(ActorId::new("g_jpg", 1), ActorParams::finite());
        assert_eq!(instruction.actions().len(), 1);
        instruction.set_flag(InstructionFlag::CleanupDataMakers);
        assert_eq!(instruction.flag(), InstructionFlag::CleanupDataMakers);
        assert!(!instruction.is_stop());
    }

    #[test]
    fn cycle_feedback_carries_exhaustion_context() {
        let quiet = CycleFeedback::quiet();
        assert!(!quiet.need_change());
        assert!(quiet.exhausted().is_empty());

        let feedback = CycleFeedback::change_needed(vec![ExhaustedDataMaker {
            index: 0,
            kind: "generator".to_string(),
            name: "g_jpg".to_string(),
        }]);
        assert!(feedback.need_change());
        assert_eq!(feedback.exhausted().len(), 1);
        assert_eq!(feedback.exhausted()[0].name, "g_jpg");
    }

    #[test]
    fn last_instruction_defaults_to_no_export() {
        let verdict = LastInstruction::none();
        assert!(verdict.export().is_none());
        assert!(verdict.target_feedback().is_none());

        let mut verdict = LastInstruction::none();
        verdict.set_export(ExportRequest::with_comment("crash"));
        verdict.set_target_feedback(b"stderr output".to_vec());
        assert_eq!(
            verdict.export().unwrap().comment.as_deref(),
            Some("crash")
        );
        assert_eq!(verdict.target_feedback(), Some(b"stderr output".as_ref()));
    }
}
