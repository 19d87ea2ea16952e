pub mod config;
pub mod engine;
pub mod export;
pub mod monitor;
pub mod operation;
pub mod operator;
pub mod probe;
pub mod target;

pub use config::ConductorConfig;
pub use engine::{
    Campaign, CampaignBuilder, CampaignError, EngineOps, OptionDescriptor, OptionValue,
};
pub use export::{ArtifactSink, ExportError};
pub use monitor::{Monitor, MonitorError};
pub use operation::{
    ActorId, ActorParams, CycleFeedback, ExhaustedDataMaker, ExportRequest, Instruction,
    InstructionFlag, LastInstruction,
};
pub use operator::{Operator, OperatorError, SequencingConfig, SequencingMode, SequencingOperator};
pub use probe::{HEALTH_PROBE_NAME, HealthCode, HealthMonitorProbe, HealthStatus, Probe};
pub use target::{LocalViewerTarget, PrinterTarget, ProcessControl, Target, TargetError};
