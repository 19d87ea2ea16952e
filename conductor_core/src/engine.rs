use crate::monitor::Monitor;
use crate::operator::Operator;
use crate::probe::Probe;
use thiserror::Error;

/// The slice of the host fuzzing engine an operator is allowed to see.
///
/// The engine itself (data model, mutation machinery, campaign scheduling)
/// is an external collaborator; operators only consume this interface.
pub trait EngineOps {
    /// Ordered list of generator-source identifiers currently known to the
    /// engine. Snapshot semantics: the operator copies it once at start.
    fn known_generator_ids(&self) -> Vec<String>;
}

/// Default value of a declared configuration option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Int(i64),
    Str(String),
}

/// One entry of an operator's configuration schema, registered with the host
/// at load time so it can surface names, defaults and descriptions.
#[derive(Debug, Clone)]
pub struct OptionDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub default: OptionValue,
}

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("campaign '{0}' has no operator attached")]
    MissingOperator(String),
}

/// A fully assembled campaign: one operator, its monitor (with every probe
/// registered), and the declared option schema.
pub struct Campaign {
    name: String,
    operator: Box<dyn Operator>,
    monitor: Monitor,
    options: Vec<OptionDescriptor>,
}

impl Campaign {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &[OptionDescriptor] {
        &self.options
    }

    /// Splits the campaign into the two halves the per-cycle loop needs to
    /// borrow simultaneously.
    pub fn parts_mut(&mut self) -> (&mut dyn Operator, &mut Monitor) {
        (self.operator.as_mut(), &mut self.monitor)
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }
}

/// Assembles a [`Campaign`] from explicitly provided component instances.
///
/// This replaces registration-by-decorator and module-level singletons: the
/// host constructs the operator and probes it wants and wires them up here
/// at campaign-assembly time.
pub struct CampaignBuilder {
    name: String,
    operator: Option<Box<dyn Operator>>,
    probes: Vec<Box<dyn Probe>>,
    options: Vec<OptionDescriptor>,
}

impl CampaignBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator: None,
            probes: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn operator(mut self, operator: Box<dyn Operator>) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn probe(mut self, probe: Box<dyn Probe>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn options(mut self, options: Vec<OptionDescriptor>) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Campaign, CampaignError> {
        let operator = self
            .operator
            .ok_or_else(|| CampaignError::MissingOperator(self.name.clone()))?;
        let mut monitor = Monitor::new();
        for probe in self.probes {
            monitor.register(probe);
        }
        Ok(Campaign {
            name: self.name,
            operator,
            monitor,
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{SequencingConfig, SequencingOperator};
    use crate::probe::{HEALTH_PROBE_NAME, HealthMonitorProbe};

    #[test]
    fn builder_without_operator_fails() {
        let result = CampaignBuilder::new("jpg").build();
        match result {
            Err(CampaignError::MissingOperator(name)) => assert_eq!(name, "jpg"),
            Ok(_) => panic!("building without an operator must fail"),
        }
    }

    #[test]
    fn builder_registers_probes_on_the_campaign_monitor() {
        let campaign = CampaignBuilder::new("jpg")
            .operator(Box::new(SequencingOperator::new(
                SequencingConfig::default(),
            )))
            .probe(Box::new(HealthMonitorProbe::new()))
            .options(SequencingOperator::option_schema())
            .build()
            .unwrap();

        assert_eq!(campaign.name(), "jpg");
        assert_eq!(campaign.options().len(), 4);
        // Registered but not started yet.
        assert!(!campaign.monitor().is_running(HEALTH_PROBE_NAME));
    }
}
