pub mod api;
pub mod backward_step;
pub mod forward_step;
pub mod instance;
pub mod params;
pub mod rule;
pub mod state_snapshot;

mod spike_delivery;
mod types;
mod util;

pub use types::NeuronId;
