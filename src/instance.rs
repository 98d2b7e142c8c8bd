use std::collections::{BTreeMap, VecDeque};

use log::{debug, warn};
use simple_error::{try_with, SimpleError, SimpleResult};

use crate::backward_step;
use crate::forward_step;
use crate::params::{self, InstanceParams, NetworkParams};
use crate::state_snapshot::{self, StateSnapshot};
use crate::types::NeuronId;

pub fn create_instance(params: InstanceParams) -> Result<Instance, SimpleError> {
    try_with!(
        params::validate_instance_params(&params),
        "invalid instance parameters"
    );

    let snapshot = state_snapshot::initialize(&params.network);

    Ok(Instance {
        params,
        snapshot,
        history: VecDeque::new(),
        tick_period: 0,
    })
}

#[derive(Debug, Clone)]
pub struct TickResult {
    pub t: usize,
    pub changed: bool,
    pub snapshot: StateSnapshot,
}

/// Drives a single simulation run: holds the topology, the current snapshot
/// and the snapshots it has moved past.
#[derive(Debug)]
pub struct Instance {
    params: InstanceParams,
    snapshot: StateSnapshot,
    history: VecDeque<StateSnapshot>,
    tick_period: usize,
}

impl Instance {
    pub fn get_params(&self) -> &InstanceParams {
        &self.params
    }

    pub fn get_snapshot(&self) -> &StateSnapshot {
        &self.snapshot
    }

    /// Number of ticks that changed the network since initialization.
    pub fn get_tick_period(&self) -> usize {
        self.tick_period
    }

    pub fn get_history_len(&self) -> usize {
        self.history.len()
    }

    /// Advances the run by one tick. A tick on a quiescent network leaves the
    /// instance untouched and reports `changed == false`.
    pub fn tick(&mut self) -> TickResult {
        let t = self.tick_period;
        let result = forward_step::step(
            &self.params.network,
            &self.snapshot,
            &self.params.simulation_params,
        );

        if result.changed {
            let previous = std::mem::replace(&mut self.snapshot, result.snapshot.clone());
            self.push_history(previous);
            self.tick_period += 1;
        }

        TickResult {
            t,
            changed: result.changed,
            snapshot: result.snapshot,
        }
    }

    /// Returns to the previous snapshot. Retained history is restored exactly;
    /// beyond it the snapshot is reconstructed by `backward_step::step_back`,
    /// which is lossy.
    pub fn tick_back(&mut self) -> SimpleResult<StateSnapshot> {
        if self.tick_period == 0 {
            return Err(SimpleError::new(
                "cannot step back past the initial snapshot",
            ));
        }

        let previous = match self.history.pop_back() {
            Some(previous) => previous,
            None => {
                debug!(
                    "no retained history at t = {}, reconstructing previous snapshot",
                    self.tick_period
                );
                backward_step::step_back(&self.params.network, &self.snapshot)
            }
        };

        self.snapshot = previous.clone();
        self.tick_period -= 1;

        Ok(previous)
    }

    /// Ticks until the network is quiescent or `max_ticks` ticks changed it.
    /// Returns the number of ticks that changed the network.
    pub fn run_until_quiescent(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;

        while ticks < max_ticks {
            if !self.tick().changed {
                break;
            }
            ticks += 1;
        }

        ticks
    }

    /// Discards the run and starts over from the initial snapshot.
    pub fn rewind(&mut self) {
        self.snapshot = state_snapshot::initialize(&self.params.network);
        self.history.clear();
        self.tick_period = 0;
    }

    /// Replaces the topology between ticks. The current snapshot is kept;
    /// neurons new to the topology join with their initial state on the next
    /// tick. Out-edges left dangling by a deletion are accepted, and so are
    /// repeated out-edges; both are logged.
    pub fn set_network(&mut self, network: NetworkParams) -> Result<(), SimpleError> {
        try_with!(params::validate_network_edit(&network), "invalid network");

        for (nid, target) in network.dangling_out_edges() {
            warn!("neuron {} keeps an out-edge to unknown neuron {}", nid, target);
        }

        for (nid, target) in network.duplicate_out_edges() {
            warn!("neuron {} has a repeated out-edge to {}", nid, target);
        }

        self.params.network = network;
        Ok(())
    }

    pub fn get_output_bitstrings(&self) -> BTreeMap<NeuronId, String> {
        self.params
            .network
            .output_ids()
            .map(|nid| {
                let bitstring = self
                    .snapshot
                    .get(nid)
                    .and_then(|state| state.bitstring.clone())
                    .unwrap_or_default();
                (nid.clone(), bitstring)
            })
            .collect()
    }

    fn push_history(&mut self, snapshot: StateSnapshot) {
        self.history.push_back(snapshot);

        if let Some(limit) = self.params.simulation_params.history_limit {
            while self.history.len() > limit {
                self.history.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::params::NeuronParams;
    use crate::util::test_util;

    #[test]
    fn initial_state() {
        let instance = create_instance(test_util::get_template_instance_params()).unwrap();

        assert_eq!(instance.get_tick_period(), 0);
        assert_eq!(instance.get_history_len(), 0);
        assert_eq!(
            *instance.get_snapshot(),
            state_snapshot::initialize(&test_util::get_chain_network())
        );
    }

    #[test]
    fn invalid_params() {
        let mut params = test_util::get_template_instance_params();
        params.simulation_params.history_limit = Some(0);

        let result = create_instance(params);

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().as_str(),
            "invalid instance parameters, history_limit must be strictly positive"
        );
    }

    #[test]
    fn tick_and_tick_back() {
        let mut instance = create_instance(test_util::get_template_instance_params()).unwrap();
        let mut forward = vec![instance.get_snapshot().clone()];

        for t in 0..3 {
            let tick_result = instance.tick();
            assert_eq!(tick_result.t, t);
            assert!(tick_result.changed);
            forward.push(tick_result.snapshot);
        }

        assert_eq!(instance.get_tick_period(), 3);
        assert_eq!(instance.get_output_bitstrings()["q2"], "001");

        for t in (0..3).rev() {
            let previous = instance.tick_back().unwrap();
            assert!(previous.ptr_eq(&forward[t]));
            assert_eq!(instance.get_tick_period(), t);
        }

        let result = instance.tick_back();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().as_str(),
            "cannot step back past the initial snapshot"
        );
    }

    #[test]
    fn quiescent_tick_does_not_advance() {
        let mut instance = create_instance(test_util::get_template_instance_params()).unwrap();

        assert_eq!(instance.run_until_quiescent(100), 3);
        assert_eq!(instance.get_tick_period(), 3);

        let before = instance.get_snapshot().clone();
        let tick_result = instance.tick();

        assert!(!tick_result.changed);
        assert_eq!(tick_result.t, 3);
        assert!(tick_result.snapshot.ptr_eq(&before));
        assert_eq!(instance.get_tick_period(), 3);
        assert_eq!(instance.get_history_len(), 3);
    }

    #[test]
    fn run_limit() {
        let mut instance = create_instance(test_util::get_template_instance_params()).unwrap();

        assert_eq!(instance.run_until_quiescent(2), 2);
        assert_eq!(instance.get_tick_period(), 2);
    }

    #[test]
    fn bounded_history_falls_back_to_reconstruction() {
        let mut params = test_util::get_template_instance_params();
        params.simulation_params.history_limit = Some(1);
        let mut instance = create_instance(params).unwrap();

        let forward: Vec<_> = std::iter::once(instance.get_snapshot().clone())
            .chain((0..3).map(|_| instance.tick().snapshot))
            .collect();

        assert_eq!(instance.get_history_len(), 1);

        let s2 = instance.tick_back().unwrap();
        assert!(s2.ptr_eq(&forward[2]));

        let s1 = instance.tick_back().unwrap();
        assert!(!s1.ptr_eq(&forward[1]));
        assert_eq!(s1, forward[1]);

        let s0 = instance.tick_back().unwrap();
        assert_eq!(s0, forward[0]);
    }

    #[test]
    fn rewind() {
        let mut instance = create_instance(test_util::get_template_instance_params()).unwrap();
        instance.run_until_quiescent(10);

        instance.rewind();

        assert_eq!(instance.get_tick_period(), 0);
        assert_eq!(instance.get_history_len(), 0);
        assert_eq!(instance.get_output_bitstrings()["q2"], "");
    }

    #[test]
    fn edit_network_between_ticks() {
        let mut instance = create_instance(test_util::get_template_instance_params()).unwrap();
        instance.tick();

        let mut network = test_util::get_chain_network();
        network
            .neurons
            .insert("q3".to_owned(), NeuronParams::output("q3", 0));
        network.neurons.insert(
            "q1".to_owned(),
            NeuronParams::regular("q1", 2, &["aa/aa->a;2"], &["q2", "q3"]),
        );
        instance.set_network(network).unwrap();

        instance.run_until_quiescent(10);

        let bitstrings = instance.get_output_bitstrings();
        assert_eq!(bitstrings["q2"], "001");
        assert_eq!(bitstrings["q3"], "01");
    }

    #[test]
    fn delete_neuron_between_ticks() {
        let mut instance = create_instance(test_util::get_template_instance_params()).unwrap();
        instance.tick();

        let mut network = test_util::get_chain_network();
        network.neurons.remove("q2");
        instance.set_network(network).unwrap();

        assert_eq!(instance.run_until_quiescent(10), 2);

        let q1 = instance.get_snapshot().get("q1").unwrap();
        assert_eq!(q1.spikes, 0);
        assert_eq!(q1.rule, None);
        assert!(instance.get_output_bitstrings().is_empty());
    }

    #[test]
    fn repeated_out_edge_delivers_per_occurrence() {
        let mut instance = create_instance(test_util::get_template_instance_params()).unwrap();
        instance.tick();

        let mut network = test_util::get_chain_network();
        network.neurons.insert(
            "q1".to_owned(),
            NeuronParams::regular("q1", 2, &["aa/aa->a;2"], &["q2", "q2"]),
        );
        instance.set_network(network).unwrap();
        instance.run_until_quiescent(10);

        assert_eq!(instance.get_output_bitstrings()["q2"], "002");
        assert_eq!(instance.get_snapshot().get("q2").unwrap().spikes, 4);
    }

    #[test]
    fn reject_invalid_network_edit() {
        let mut instance = create_instance(test_util::get_template_instance_params()).unwrap();

        let mut network = test_util::get_chain_network();
        network.neurons.insert(
            "q1".to_owned(),
            NeuronParams::regular("q7", 2, &["aa/aa->a;2"], &["q2"]),
        );

        let result = instance.set_network(network);

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().as_str(),
            "invalid network, neuron key 'q1' does not match id 'q7'"
        );
        assert_eq!(instance.get_params().network.neurons["q1"].id, "q1");
    }
}
