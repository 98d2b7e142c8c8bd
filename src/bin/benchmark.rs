use std::time::Instant;

use snapse::instance;

#[path = "../scenario_params.rs"]
mod scenario_params;

fn main() {
    let mut instance =
        instance::create_instance(scenario_params::get_scenario_params(2000, 50)).unwrap();

    let t_stop = 5000;
    let mut changed_count = 0usize;

    let wall_start = Instant::now();

    for _ in 0..t_stop {
        if instance.tick().changed {
            changed_count += 1;
        }
    }

    let forward_time = wall_start.elapsed();

    let checksum: usize = instance
        .get_output_bitstrings()
        .values()
        .map(|bitstring| bitstring.bytes().filter(|symbol| *symbol != b'0').count())
        .sum();

    let back_start = Instant::now();

    for _ in 0..changed_count {
        instance.tick_back().unwrap();
    }

    let back_time = back_start.elapsed();

    eprintln!("Ticks with activity: {} of {}", changed_count, t_stop);
    eprintln!(
        "Forward: {:.3} us per tick",
        forward_time.as_secs_f64() * 1e6 / t_stop as f64
    );
    eprintln!(
        "Backward: {:.3} us per tick",
        back_time.as_secs_f64() * 1e6 / changed_count.max(1) as f64
    );
    eprintln!("Checksum: {}", checksum);
}
