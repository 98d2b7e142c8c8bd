use log::debug;

use crate::rule::{self, Rule};

/// Parses the rule text a neuron state carries. The text was valid when the
/// rule activated, but the topology may have been edited since.
pub fn parse_state_rule(nid: &str, text: &str) -> Option<Rule> {
    match rule::parse(text) {
        Ok(rule) => Some(rule),
        Err(err) => {
            debug!("neuron {} carries an unparseable rule: {}", nid, err);
            None
        }
    }
}

#[cfg(test)]
pub mod test_util {
    use crate::params::{InstanceParams, NetworkParams, NeuronParams};

    /// q0 (2 spikes, `a/a->a;1`) -> q1 (2 spikes, `aa/aa->a;2`) -> q2 (output).
    pub fn get_chain_network() -> NetworkParams {
        NetworkParams::from_iter([
            NeuronParams::regular("q0", 2, &["a/a->a;1"], &["q1"]).at(250.0, 250.0),
            NeuronParams::regular("q1", 2, &["aa/aa->a;2"], &["q2"]).at(400.0, 250.0),
            NeuronParams::output("q2", 2).at(600.0, 250.0),
        ])
    }

    pub fn get_template_instance_params() -> InstanceParams {
        InstanceParams {
            network: get_chain_network(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_rule() {
        assert_eq!(
            parse_state_rule("q1", "aa/aa->a;2"),
            Some(Rule {
                requires: 2,
                consumes: 2,
                produces: 1,
                delay: 2
            })
        );
        assert_eq!(parse_state_rule("q1", "aa/aa->"), None);
    }
}
