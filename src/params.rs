use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use simple_error::SimpleError;

use crate::rule;
use crate::types::{HashSet, NeuronId};

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceParams {
    pub network: NetworkParams,
    #[serde(default)]
    pub simulation_params: SimulationParams,
}

/// Static topology of an SN P system, keyed by neuron id. Serializes verbatim
/// as the id-to-neuron mapping, which doubles as the exchange format.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkParams {
    pub neurons: BTreeMap<NeuronId, NeuronParams>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronParams {
    pub id: NeuronId,
    pub spikes: i64,
    #[serde(default)]
    pub position: Position,
    #[serde(flatten)]
    pub kind: NeuronKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NeuronKind {
    Regular {
        rules: Vec<String>,
        out: Vec<NeuronId>,
    },
    Output,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// When an idle neuron's first rule is allowed to activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationPolicy {
    /// `spikes == requires`
    ExactMatch,
    /// `spikes >= requires`
    Threshold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub activation_policy: ActivationPolicy,
    /// Number of past snapshots an instance retains for exact backward
    /// navigation. `None` keeps the whole run.
    pub history_limit: Option<usize>,
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        ActivationPolicy::ExactMatch
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            activation_policy: ActivationPolicy::default(),
            history_limit: None,
        }
    }
}

impl ActivationPolicy {
    pub fn accepts(&self, spikes: i64, requires: u32) -> bool {
        let requires = i64::from(requires);
        match self {
            ActivationPolicy::ExactMatch => spikes == requires,
            ActivationPolicy::Threshold => spikes >= requires,
        }
    }
}

impl NeuronParams {
    pub fn regular(id: &str, spikes: i64, rules: &[&str], out: &[&str]) -> Self {
        Self {
            id: id.to_owned(),
            spikes,
            position: Position::default(),
            kind: NeuronKind::Regular {
                rules: rules.iter().map(|rule| rule.to_string()).collect(),
                out: out.iter().map(|nid| nid.to_string()).collect(),
            },
        }
    }

    pub fn output(id: &str, spikes: i64) -> Self {
        Self {
            id: id.to_owned(),
            spikes,
            position: Position::default(),
            kind: NeuronKind::Output,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }

    pub fn is_output(&self) -> bool {
        matches!(self.kind, NeuronKind::Output)
    }

    pub fn rules(&self) -> &[String] {
        match &self.kind {
            NeuronKind::Regular { rules, .. } => rules,
            NeuronKind::Output => &[],
        }
    }

    pub fn out(&self) -> &[NeuronId] {
        match &self.kind {
            NeuronKind::Regular { out, .. } => out,
            NeuronKind::Output => &[],
        }
    }

    pub fn has_valid_rules(&self) -> bool {
        rule::validate_all(self.rules())
    }
}

impl NetworkParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, nid: &str) -> Option<&NeuronParams> {
        self.neurons.get(nid)
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    pub fn output_ids(&self) -> impl Iterator<Item = &NeuronId> + '_ {
        self.neurons
            .iter()
            .filter(|(_, neuron)| neuron.is_output())
            .map(|(nid, _)| nid)
    }

    /// Regular neurons carrying at least one rule that does not parse. Such
    /// neurons never fire; editors are expected to flag them.
    pub fn invalid_rule_neurons(&self) -> Vec<&NeuronId> {
        self.neurons
            .iter()
            .filter(|(_, neuron)| !neuron.has_valid_rules())
            .map(|(nid, _)| nid)
            .collect()
    }

    /// Out-edges pointing at ids missing from the topology, as
    /// `(source, target)` pairs.
    pub fn dangling_out_edges(&self) -> Vec<(&NeuronId, &NeuronId)> {
        self.neurons
            .iter()
            .flat_map(|(nid, neuron)| neuron.out().iter().map(move |target| (nid, target)))
            .filter(|(_, target)| !self.neurons.contains_key(*target))
            .collect()
    }

    /// Repeated out-edges, reported once per extra occurrence. Every
    /// occurrence delivers, so the target receives a multiple of the product.
    pub fn duplicate_out_edges(&self) -> Vec<(&NeuronId, &NeuronId)> {
        let mut duplicates = Vec::new();

        for (nid, neuron) in &self.neurons {
            let mut seen_targets = HashSet::default();
            for target in neuron.out() {
                if !seen_targets.insert(target) {
                    duplicates.push((nid, target));
                }
            }
        }

        duplicates
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimpleError> {
        serde_json::from_str(json).map_err(|err| SimpleError::with("malformed network json", err))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, SimpleError> {
        serde_yaml::from_str(yaml).map_err(|err| SimpleError::with("malformed network yaml", err))
    }

    pub fn to_json_string(&self) -> Result<String, SimpleError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| SimpleError::with("failed to serialize network", err))
    }
}

impl FromIterator<NeuronParams> for NetworkParams {
    fn from_iter<T: IntoIterator<Item = NeuronParams>>(iter: T) -> Self {
        Self {
            neurons: iter
                .into_iter()
                .map(|neuron| (neuron.id.clone(), neuron))
                .collect(),
        }
    }
}

impl InstanceParams {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SimpleError> {
        serde_yaml::from_str(yaml)
            .map_err(|err| SimpleError::with("malformed instance params yaml", err))
    }
}

pub fn validate_instance_params(instance_params: &InstanceParams) -> Result<(), SimpleError> {
    validate_network_params(&instance_params.network)?;
    validate_simulation_params(&instance_params.simulation_params)?;

    Ok(())
}

/// Structural checks only. Unparseable rule text is legitimate while a network
/// is being edited and is therefore not rejected here.
pub fn validate_network_params(network: &NetworkParams) -> Result<(), SimpleError> {
    validate_neurons(network)?;

    if let Some((nid, target)) = network.dangling_out_edges().first() {
        return Err(SimpleError::new(format!(
            "neuron {}: out-edge to unknown neuron {}",
            nid, target
        )));
    }

    if let Some((nid, target)) = network.duplicate_out_edges().first() {
        return Err(SimpleError::new(format!(
            "neuron {}: duplicate out-edge to {}",
            nid, target
        )));
    }

    Ok(())
}

/// Checks applied to a topology that replaces the one of a running instance.
/// Dangling and duplicate out-edges are tolerated there: an edit may delete a
/// neuron that others still point at.
pub fn validate_network_edit(network: &NetworkParams) -> Result<(), SimpleError> {
    validate_neurons(network)
}

fn validate_neurons(network: &NetworkParams) -> Result<(), SimpleError> {
    for (nid, neuron) in &network.neurons {
        if *nid != neuron.id {
            return Err(SimpleError::new(format!(
                "neuron key '{}' does not match id '{}'",
                nid, neuron.id
            )));
        }

        if neuron.spikes < 0 {
            return Err(SimpleError::new(format!(
                "neuron {}: initial spike count must not be negative",
                nid
            )));
        }
    }

    Ok(())
}

fn validate_simulation_params(simulation_params: &SimulationParams) -> Result<(), SimpleError> {
    if simulation_params.history_limit == Some(0) {
        return Err(SimpleError::new("history_limit must be strictly positive"));
    }

    Ok(())
}
