use log::{debug, trace, warn};
use simple_error::SimpleResult;

use crate::params::{NetworkParams, NeuronKind, SimulationParams};
use crate::rule::{self, Rule};
use crate::spike_delivery::ScheduledDeliveries;
use crate::state_snapshot::{NeuronState, StateSnapshot};
use crate::types::NeuronId;
use crate::util;

#[derive(Debug, Clone)]
pub struct StepResult {
    pub snapshot: StateSnapshot,
    /// False if no neuron was firing or activated. The returned snapshot is
    /// then the input snapshot itself.
    pub changed: bool,
}

/// Computes the next snapshot under synchronous-parallel semantics: every
/// neuron decides from `snapshot` alone and all spike deliveries are committed
/// together at the end of the tick.
///
/// Only the first rule of a neuron is ever considered for activation. A
/// neuron with any unparseable rule, or without out-edges, never activates,
/// and neither does one holding fewer spikes than its rule consumes. A locked
/// neuron receives nothing, so its count cannot drop below zero on resolution.
pub fn step(
    network: &NetworkParams,
    snapshot: &StateSnapshot,
    simulation_params: &SimulationParams,
) -> StepResult {
    let mut states = snapshot.to_working_copy();
    let mut deliveries = ScheduledDeliveries::new();
    let mut changed = false;

    for (nid, neuron) in &network.neurons {
        let state = states
            .entry(nid.clone())
            .or_insert_with(|| NeuronState::initial(neuron));

        state.just_resolved_rule = None;

        let (rules, out) = match &neuron.kind {
            NeuronKind::Regular { rules, out } => (rules, out),
            NeuronKind::Output => continue,
        };

        let parsed_rules: SimpleResult<Vec<Rule>> =
            rules.iter().map(|text| rule::parse(text)).collect();

        let parsed_rules = match parsed_rules {
            Ok(parsed_rules) => parsed_rules,
            Err(_) => continue,
        };

        if state.delay > 0 {
            changed = true;
            state.delay -= 1;

            if state.delay == 0 {
                resolve(nid, state, out, &mut deliveries);
            }
        } else if !out.is_empty() {
            if let Some(first_rule) = parsed_rules.first() {
                if simulation_params
                    .activation_policy
                    .accepts(state.spikes, first_rule.requires)
                    && state.spikes >= i64::from(first_rule.consumes)
                {
                    changed = true;
                    trace!("neuron {} activates {}", nid, rules[0]);
                    state.rule = Some(rules[0].clone());
                    state.delay = first_rule.delay;

                    if first_rule.delay == 0 {
                        resolve(nid, state, out, &mut deliveries);
                    }
                }
            }
        }
    }

    if !changed {
        debug!("network is quiescent");
        return StepResult {
            snapshot: snapshot.clone(),
            changed,
        };
    }

    for (nid, neuron) in &network.neurons {
        if neuron.is_output() {
            if let Some(state) = states.get_mut(nid) {
                let symbol = deliveries
                    .amount_for(nid)
                    .map_or_else(|| "0".to_owned(), |amount| amount.to_string());
                state.bitstring.get_or_insert_with(String::new).push_str(&symbol);
            }
        }
    }

    for (target, amount) in deliveries.drain() {
        if !network.neurons.contains_key(&target) {
            warn!("dropping {} spikes sent to unknown neuron {}", amount, target);
            continue;
        }

        if let Some(state) = states.get_mut(&target) {
            if state.is_locked() {
                trace!("neuron {} is locked, dropping {} spikes", target, amount);
            } else {
                state.spikes += amount;
            }
        }
    }

    StepResult {
        snapshot: StateSnapshot::new(states),
        changed,
    }
}

fn resolve(
    nid: &str,
    state: &mut NeuronState,
    out: &[NeuronId],
    deliveries: &mut ScheduledDeliveries,
) {
    let text = match state.rule.take() {
        Some(text) => text,
        None => return,
    };

    if let Some(rule) = util::parse_state_rule(nid, &text) {
        trace!("neuron {} resolves {}", nid, text);
        state.spikes -= i64::from(rule.consumes);
        deliveries.schedule_to_all(out, i64::from(rule.produces));
        state.just_resolved_rule = Some(text);
    }
}
