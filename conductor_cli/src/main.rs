use conductor_core::config::{ConductorConfig, TargetType};
use conductor_core::{
    ArtifactSink, CampaignBuilder, CycleFeedback, EngineOps, ExhaustedDataMaker,
    HealthMonitorProbe, Instruction, InstructionFlag, LocalViewerTarget, PrinterTarget,
    SequencingOperator, Target,
};

use clap::Parser;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use std::path::PathBuf;
use tracing::{info, warn};

/// How many payloads each demo generator yields before it reports itself
/// exhausted and the operator has to move on.
const YIELDS_PER_GENERATOR: u32 = 8;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(short, long, value_parser)]
    config_file: Option<PathBuf>,
    #[clap(long)]
    max_steps: Option<u32>,
    #[clap(long)]
    export_dir: Option<PathBuf>,
}

/// Stand-in for the real fuzzing engine: a fixed set of generator ids and a
/// deterministic payload synthesizer. Real campaigns plug an actual engine in
/// behind [`EngineOps`]; this one exists so the control loop can be driven
/// end to end.
struct StubEngine {
    gen_ids: Vec<String>,
    yields_left: u32,
    rng: ChaCha8Rng,
}

impl StubEngine {
    fn new() -> Self {
        Self {
            gen_ids: vec!["g_jpg".to_string(), "g_jpg_bigimg".to_string()],
            yields_left: YIELDS_PER_GENERATOR,
            rng: ChaCha8Rng::from_seed([0u8; 32]),
        }
    }

    /// Executes one instruction: synthesizes the test-case bytes and reports
    /// whether the current generator ran dry.
    fn execute(&mut self, instruction: &Instruction) -> (Vec<u8>, CycleFeedback) {
        if instruction.flag() == InstructionFlag::CleanupDataMakers {
            self.yields_left = YIELDS_PER_GENERATOR;
        }

        // JPEG-shaped payload: SOI/APP0 marker, random body, EOI marker.
        let mut payload = vec![0xFF, 0xD8, 0xFF, 0xE0];
        let mut body = vec![0u8; 64];
        self.rng.fill_bytes(&mut body);
        payload.extend_from_slice(&body);
        payload.extend_from_slice(&[0xFF, 0xD9]);

        self.yields_left = self.yields_left.saturating_sub(1);
        let feedback = if self.yields_left == 0 {
            let name = instruction
                .actions()
                .first()
                .map(|(actor, _)| actor.name().to_string())
                .unwrap_or_default();
            CycleFeedback::change_needed(vec![ExhaustedDataMaker {
                index: 0,
                kind: "generator".to_string(),
                name,
            }])
        } else {
            CycleFeedback::quiet()
        };
        (payload, feedback)
    }
}

impl EngineOps for StubEngine {
    fn known_generator_ids(&self) -> Vec<String> {
        self.gen_ids.clone()
    }
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config_file {
        Some(config_path) => {
            println!("Loading configuration from specified path: {config_path:?}");
            ConductorConfig::load_from_file(&config_path)?
        }
        None => {
            let default_config_path = PathBuf::from("conductor.toml");
            if default_config_path.exists() {
                println!(
                    "No config file specified via CLI, loading default: {default_config_path:?}",
                );
                ConductorConfig::load_from_file(&default_config_path)?
            } else {
                println!(
                    "No config file specified and default 'conductor.toml' not found, using built-in defaults."
                );
                ConductorConfig::default()
            }
        }
    };

    if let Some(max_steps) = cli.max_steps {
        config
            .operator
            .get_or_insert_with(Default::default)
            .max_steps = max_steps;
    }
    if let Some(export_dir) = cli.export_dir {
        config.export.get_or_insert_with(Default::default).dir = export_dir;
    }

    println!("Effective configuration: {config:#?}");

    let operator_settings = config.operator.unwrap_or_default();
    let mut target: Box<dyn Target> = match config.target.target_type {
        TargetType::LocalViewer => {
            let settings = config.target.local_settings.unwrap_or_default();
            Box::new(LocalViewerTarget::new(settings.path, settings.tmpfile_ext))
        }
        TargetType::Printer => {
            let settings = config.target.printer_settings.ok_or_else(|| {
                anyhow::anyhow!("Printer settings missing for printer target type in config")
            })?;
            let mut printer = PrinterTarget::new(settings.ip, settings.tmpfile_ext);
            if let Some(name) = settings.printer_name {
                printer = printer.with_printer_name(name);
            }
            Box::new(printer)
        }
    };

    let export_settings = config.export.unwrap_or_default();
    let sink = ArtifactSink::new(&export_settings.dir, export_settings.extension)?;

    let mut campaign = CampaignBuilder::new("jpg")
        .operator(Box::new(SequencingOperator::new(
            operator_settings.to_sequencing_config(),
        )))
        .probe(Box::new(HealthMonitorProbe::new()))
        .options(SequencingOperator::option_schema())
        .build()?;

    let mut engine = StubEngine::new();

    let (operator, monitor) = campaign.parts_mut();
    operator.start(&engine, target.as_mut(), monitor)?;

    println!(
        "Starting campaign 'jpg' ({} steps max, exporting to {:?})...",
        operator_settings.max_steps, export_settings.dir
    );

    let mut feedback = CycleFeedback::quiet();
    let mut cycles = 0u32;
    let mut exported = 0u32;

    loop {
        let instruction = operator.plan_next_operation(&feedback);
        if instruction.is_stop() {
            break;
        }
        cycles += 1;

        let (payload, next_feedback) = engine.execute(&instruction);
        info!(
            cycle = cycles,
            actions = instruction.actions().len(),
            actor = %instruction.actions()[0].0,
            bytes = payload.len(),
            "executing instruction"
        );

        if let Err(e) = target.deliver(&payload) {
            // Delivery trouble must not kill the whole campaign; the probe
            // classifies the fallout on the next poll.
            warn!(error = %e, "test case delivery failed");
        }

        // Probe sampling for this cycle has to observe the feedback the
        // instruction above produced, before the operator's verdict.
        monitor.poll(target.as_mut());
        let verdict = operator.do_after_all(target.as_mut(), monitor)?;

        if let Some(request) = verdict.export() {
            sink.export(&payload, request.comment.as_deref())?;
            exported += 1;
        }

        feedback = next_feedback;
    }

    operator.stop(target.as_mut(), monitor)?;

    println!("Campaign finished: {cycles} cycles run, {exported} test case(s) exported.");
    Ok(())
}
