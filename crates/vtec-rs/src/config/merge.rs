use std::path::PathBuf;

use crate::core::{Office, ProductClass};

use super::{Config, ConfigLayer};

pub fn merge_layers(user: Option<ConfigLayer>, site: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    if let Some(layer) = user {
        layer.apply_to(&mut config);
    }
    if let Some(layer) = site {
        layer.apply_to(&mut config);
    }
    config
}

pub fn apply_env_overrides(config: &mut Config) {
    apply_env_overrides_from(config, |var| std::env::var(var).ok());
}

/// Applies `VTEC_*` overrides read through `lookup`. Invalid values are
/// logged and ignored.
pub fn apply_env_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let read = |var: &str| {
        lookup(var)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
    };

    if let Some(raw) = read("VTEC_OFFICE") {
        match Office::new(raw) {
            Ok(office) => config.defaults.office = Some(office),
            Err(err) => tracing::warn!("invalid VTEC_OFFICE, ignoring: {err}"),
        }
    }

    if let Some(raw) = read("VTEC_PRODUCT_CLASS") {
        match ProductClass::parse_str(&raw) {
            Some(class) => config.defaults.product_class = Some(class),
            None => tracing::warn!("invalid VTEC_PRODUCT_CLASS `{raw}`, ignoring"),
        }
    }

    if let Some(raw) = read("VTEC_TABLE") {
        config.table.path = Some(PathBuf::from(raw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use crate::config::{DefaultsConfig, LogFormat, LoggingConfigOverride, TableConfig};

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn site_layer_overrides_user_layer() {
        let user = ConfigLayer {
            defaults: DefaultsConfig {
                office: Some(Office::new("KMLB").unwrap()),
                product_class: Some(ProductClass::Test),
            },
            logging: LoggingConfigOverride {
                stdout_format: Some(LogFormat::Compact),
                ..LoggingConfigOverride::default()
            },
            ..ConfigLayer::default()
        };
        let site = ConfigLayer {
            defaults: DefaultsConfig {
                office: Some(Office::new("KTBW").unwrap()),
                product_class: None,
            },
            table: TableConfig {
                path: Some(PathBuf::from("site.jsonl")),
            },
            ..ConfigLayer::default()
        };

        let config = merge_layers(Some(user), Some(site));
        assert_eq!(config.defaults.office, Some(Office::new("KTBW").unwrap()));
        assert_eq!(config.defaults.product_class, Some(ProductClass::Test));
        assert_eq!(config.logging.stdout_format, LogFormat::Compact);
        assert_eq!(config.table_path(), PathBuf::from("site.jsonl"));
    }

    #[test]
    fn env_overrides_apply_trimmed_values() {
        let mut config = Config::default();
        apply_env_overrides_from(
            &mut config,
            env(&[
                ("VTEC_OFFICE", " KTBW "),
                ("VTEC_PRODUCT_CLASS", "T"),
                ("VTEC_TABLE", "/var/lib/vtec/table.jsonl"),
            ]),
        );
        assert_eq!(config.defaults.office, Some(Office::new("KTBW").unwrap()));
        assert_eq!(config.defaults.product_class, Some(ProductClass::Test));
        assert_eq!(
            config.table.path,
            Some(PathBuf::from("/var/lib/vtec/table.jsonl"))
        );
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = Config::default();
        config.defaults.office = Some(Office::new("KMLB").unwrap());
        apply_env_overrides_from(
            &mut config,
            env(&[
                ("VTEC_OFFICE", "tampa"),
                ("VTEC_PRODUCT_CLASS", "Q"),
                ("VTEC_TABLE", "   "),
            ]),
        );
        assert_eq!(config.defaults.office, Some(Office::new("KMLB").unwrap()));
        assert_eq!(config.defaults.product_class, None);
        assert_eq!(config.table.path, None);
    }
}
