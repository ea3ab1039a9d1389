//! `stratus environments` command implementation.

use stratus_core::EnvironmentRegistry;

pub fn render(registry: &EnvironmentRegistry) -> Vec<String> {
    registry
        .iter()
        .map(|env| {
            format!(
                "{:<6} org={} app={} region={} provisioned-concurrency={}",
                env.env_name.as_str(),
                env.org_name,
                env.app_name,
                env.region.as_str(),
                env.provisioned_concurrency_enabled
            )
        })
        .collect()
}

pub fn run(registry: &EnvironmentRegistry) {
    if registry.is_empty() {
        println!("No environments registered.");
        return;
    }
    for line in render(registry) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_listing() {
        let lines = render(&EnvironmentRegistry::builtin());
        assert_eq!(
            lines,
            vec!["dev    org=Wizeline app=olympic-games-kb region=us-east-1 provisioned-concurrency=false"]
        );
    }
}
