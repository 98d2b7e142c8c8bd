use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::params::{NetworkParams, NeuronParams};
use crate::types::NeuronId;

/// Runtime state of a single neuron at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuronState {
    pub spikes: i64,
    pub delay: u32,
    /// Rule in flight while the neuron is locked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// Rule that resolved on the step that produced this snapshot.
    #[serde(
        default,
        rename = "justResolvedRule",
        skip_serializing_if = "Option::is_none"
    )]
    pub just_resolved_rule: Option<String>,
    /// Output neurons only: one symbol per tick with the amount received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitstring: Option<String>,
}

impl NeuronState {
    pub fn initial(neuron: &NeuronParams) -> Self {
        Self {
            spikes: neuron.spikes,
            delay: 0,
            rule: None,
            just_resolved_rule: None,
            bitstring: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.rule.is_some()
    }
}

/// Immutable state of the whole network at one tick. Cloning shares the
/// underlying map; steppers always build a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    neuron_states: Arc<BTreeMap<NeuronId, NeuronState>>,
}

impl StateSnapshot {
    pub fn new(neuron_states: BTreeMap<NeuronId, NeuronState>) -> Self {
        Self {
            neuron_states: Arc::new(neuron_states),
        }
    }

    pub fn get(&self, nid: &str) -> Option<&NeuronState> {
        self.neuron_states.get(nid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NeuronId, &NeuronState)> + '_ {
        self.neuron_states.iter()
    }

    pub fn len(&self) -> usize {
        self.neuron_states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neuron_states.is_empty()
    }

    /// True if both handles refer to the very same snapshot, as returned by a
    /// step on a quiescent network.
    pub fn ptr_eq(&self, other: &StateSnapshot) -> bool {
        Arc::ptr_eq(&self.neuron_states, &other.neuron_states)
    }

    pub(crate) fn to_working_copy(&self) -> BTreeMap<NeuronId, NeuronState> {
        self.neuron_states.as_ref().clone()
    }
}

/// Creates the tick-0 snapshot: every neuron at its initial spike count, idle.
pub fn initialize(network: &NetworkParams) -> StateSnapshot {
    StateSnapshot::new(
        network
            .neurons
            .iter()
            .map(|(nid, neuron)| (nid.clone(), NeuronState::initial(neuron)))
            .collect(),
    )
}
