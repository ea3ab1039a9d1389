//! Naming policy for deployed resources.
//!
//! Names are always lowercased: several resource kinds reject mixed-case names.

use crate::environment::Environment;

/// Fully-qualified resource name: `{org}-{app}-{env}-{name}`, lowercased.
pub fn prefixed_name(name: &str, environment: &Environment) -> String {
    format!(
        "{}-{}-{}-{}",
        environment.org_name, environment.app_name, environment.env_name, name
    )
    .to_lowercase()
}

/// Parameter-store path: `/{app}-{env}/{name}`, lowercased.
pub fn parameter_path(name: &str, environment: &Environment) -> String {
    format!("/{}-{}/{}", environment.app_name, environment.env_name, name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{EnvironmentName, Region};

    fn acme() -> Environment {
        Environment::new("acme", "kb", EnvironmentName::Dev, Region::UsEast1)
    }

    #[test]
    fn test_prefixed_name() {
        assert_eq!(prefixed_name("ingest", &acme()), "acme-kb-dev-ingest");
    }

    #[test]
    fn test_prefixed_name_lowercases_every_segment() {
        let env = Environment::new(
            "Wizeline",
            "Olympic-Games-KB",
            EnvironmentName::Prod,
            Region::UsWest2,
        );
        let name = prefixed_name("Builder-Pattern-Secret", &env);
        assert_eq!(name, "wizeline-olympic-games-kb-prod-builder-pattern-secret");
        assert_eq!(name, name.to_lowercase());
    }

    #[test]
    fn test_prefixed_name_is_deterministic_and_ordered() {
        let env = acme();
        for base in ["a", "Search-Relationships", "x_y"] {
            let first = prefixed_name(base, &env);
            assert_eq!(first, prefixed_name(base, &env));

            let org = first.find("acme").unwrap();
            let app = first.find("-kb-").unwrap();
            let env_pos = first.find("-dev-").unwrap();
            let base_pos = first.rfind(&base.to_lowercase()).unwrap();
            assert!(org < app && app < env_pos && env_pos < base_pos);
        }
    }

    #[test]
    fn test_parameter_path() {
        assert_eq!(parameter_path("Api-Key", &acme()), "/kb-dev/api-key");
    }
}
