use snapse::params::{InstanceParams, NeuronParams};

/// A ring of `ring_size` relay neurons passing a single spike around, each
/// relay also feeding one of `num_outputs` output neurons.
pub fn get_scenario_params(ring_size: usize, num_outputs: usize) -> InstanceParams {
    let params_yaml_str = r#"
network: {}
simulation_params:
  activation_policy: ExactMatch
  history_limit: 64
"#;

    let mut params: InstanceParams = serde_yaml::from_str(params_yaml_str).unwrap();

    for i in 0..ring_size {
        let id = format!("r{}", i);
        let next = format!("r{}", (i + 1) % ring_size);
        let output = format!("o{}", i % num_outputs);
        let spikes = if i == 0 { 1 } else { 0 };
        let delay_rule = format!("a/a->a;{}", i % 3);

        params.network.neurons.insert(
            id.clone(),
            NeuronParams::regular(
                &id,
                spikes,
                &[delay_rule.as_str()],
                &[next.as_str(), output.as_str()],
            ),
        );
    }

    for i in 0..num_outputs {
        let id = format!("o{}", i);
        params
            .network
            .neurons
            .insert(id.clone(), NeuronParams::output(&id, 0));
    }

    params
}
