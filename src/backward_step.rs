use log::trace;

use crate::params::{NetworkParams, NeuronKind};
use crate::spike_delivery::ScheduledDeliveries;
use crate::state_snapshot::{NeuronState, StateSnapshot};
use crate::types::NeuronId;
use crate::util;

/// Reconstructs the snapshot preceding `snapshot`.
///
/// This is an approximation, not a true inverse. A resolution is only
/// undone while the resolving neuron still carries its just-resolved rule,
/// i.e. on the snapshot directly following it. Once that marker is gone the
/// consumed spikes and the deliveries of that resolution cannot be recovered
/// and the result diverges from the real history. Neurons that became locked
/// after a delivery was dropped cannot be told apart either. An output
/// symbol is removed whole when the amount it records is known from a
/// resolution being undone; otherwise a single character is removed, which
/// leaves a stale digit behind for amounts of ten or more.
///
/// Calling this on an initial snapshot is a precondition violation; the
/// result is then unspecified.
pub fn step_back(network: &NetworkParams, snapshot: &StateSnapshot) -> StateSnapshot {
    let mut states = snapshot.to_working_copy();
    let mut reverse_deliveries = ScheduledDeliveries::new();

    for (nid, neuron) in &network.neurons {
        let state = match states.get_mut(nid) {
            Some(state) => state,
            None => continue,
        };

        match &neuron.kind {
            NeuronKind::Regular { out, .. } => {
                undo_regular(nid, state, out, &mut reverse_deliveries);
            }
            NeuronKind::Output => {}
        }
    }

    for nid in network.output_ids() {
        if let Some(state) = states.get_mut(nid) {
            remove_last_symbol(state, reverse_deliveries.amount_for(nid));
        }
    }

    for (target, amount) in reverse_deliveries.drain() {
        if !network.neurons.contains_key(&target) {
            continue;
        }

        // mirrors the forward lock: a neuron locked after the tick did not
        // receive anything during it
        if snapshot.get(&target).map_or(false, NeuronState::is_locked) {
            continue;
        }

        if let Some(state) = states.get_mut(&target) {
            state.spikes -= amount;
        }
    }

    StateSnapshot::new(states)
}

fn remove_last_symbol(state: &mut NeuronState, received: Option<i64>) {
    let bitstring = match state.bitstring.as_mut() {
        Some(bitstring) => bitstring,
        None => return,
    };

    let symbol = received.map_or_else(|| "0".to_owned(), |amount| amount.to_string());

    if bitstring.ends_with(&symbol) {
        bitstring.truncate(bitstring.len() - symbol.len());
    } else {
        bitstring.pop();
    }

    if bitstring.is_empty() {
        state.bitstring = None;
    }
}

fn undo_regular(
    nid: &str,
    state: &mut NeuronState,
    out: &[NeuronId],
    reverse_deliveries: &mut ScheduledDeliveries,
) {
    if state.delay == 0 {
        let text = match state.just_resolved_rule.take() {
            Some(text) => text,
            None => return,
        };

        let rule = match util::parse_state_rule(nid, &text) {
            Some(rule) => rule,
            None => {
                state.just_resolved_rule = Some(text);
                return;
            }
        };

        trace!("neuron {} reverts resolution of {}", nid, text);
        state.spikes += i64::from(rule.consumes);
        reverse_deliveries.schedule_to_all(out, i64::from(rule.produces));

        // a zero-delay rule activated and resolved within one tick
        if rule.delay > 0 {
            state.rule = Some(text);
            state.delay = 1;
        }
    } else if let Some(text) = state.rule.as_ref() {
        let rule = match util::parse_state_rule(nid, text) {
            Some(rule) => rule,
            None => return,
        };

        if state.delay == rule.delay {
            trace!("neuron {} reverts activation of {}", nid, text);
            state.rule = None;
            state.delay = 0;
        } else {
            state.delay = state.delay.saturating_add(1);
        }
    }
}
