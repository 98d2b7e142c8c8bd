use crate::types::{HashMap, NeuronId};

/// Spike amounts scheduled during one tick, committed in a single batch after
/// every neuron has been evaluated so that iteration order has no effect.
#[derive(Debug, Default)]
pub struct ScheduledDeliveries {
    amounts: HashMap<NeuronId, i64>,
}

impl ScheduledDeliveries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_to_all(&mut self, targets: &[NeuronId], amount: i64) {
        for target in targets {
            *self.amounts.entry(target.clone()).or_insert(0) += amount;
        }
    }

    pub fn amount_for(&self, nid: &str) -> Option<i64> {
        self.amounts.get(nid).copied()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (NeuronId, i64)> + '_ {
        self.amounts.drain()
    }
}
