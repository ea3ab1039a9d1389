//! `stratus names` command implementation.

use stratus_core::{Environment, parameter_path, prefixed_name};

/// Lines printed for `base`: the deployed name and the parameter-store path.
pub fn render(base: &str, environment: &Environment) -> Vec<String> {
    vec![
        format!("name:      {}", prefixed_name(base, environment)),
        format!("parameter: {}", parameter_path(base, environment)),
    ]
}

pub fn run(base: &str, environment: &Environment) {
    for line in render(base, environment) {
        println!("{}", line);
    }
}
