//! Entry points consumed by editors and drivers. All of them are pure: they
//! read the topology and a snapshot and return new values.

use simple_error::SimpleResult;

pub use crate::backward_step::step_back;
pub use crate::forward_step::StepResult;
pub use crate::state_snapshot::initialize;

use crate::forward_step;
use crate::params::{NetworkParams, SimulationParams};
use crate::rule::{self, Rule};
use crate::state_snapshot::StateSnapshot;

/// Advances by one tick with the default (exact-match) activation policy.
pub fn step(network: &NetworkParams, snapshot: &StateSnapshot) -> StepResult {
    forward_step::step(network, snapshot, &SimulationParams::default())
}

pub fn step_with(
    network: &NetworkParams,
    snapshot: &StateSnapshot,
    simulation_params: &SimulationParams,
) -> StepResult {
    forward_step::step(network, snapshot, simulation_params)
}

pub fn validate_rule(text: &str) -> SimpleResult<Rule> {
    rule::parse(text)
}

pub fn validate_all_rules<S: AsRef<str>>(rules: &[S]) -> bool {
    rule::validate_all(rules)
}
