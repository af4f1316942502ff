use sail_common::config::AppConfig;

use crate::error::PlanResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanConfig {
    /// The target number of partitions for `PARTITION BY` on a table argument.
    /// [`None`] leaves the choice to the session.
    pub hash_partitions: Option<usize>,
    pub allow_multiple_table_arguments: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            hash_partitions: None,
            allow_multiple_table_arguments: true,
        }
    }
}

impl PlanConfig {
    pub fn new() -> PlanResult<Self> {
        Ok(Self::from(&AppConfig::load()?))
    }
}

impl From<&AppConfig> for PlanConfig {
    fn from(config: &AppConfig) -> Self {
        let hash_partitions = match config.table_argument.hash_partitions {
            0 => None,
            x => Some(x),
        };
        Self {
            hash_partitions,
            allow_multiple_table_arguments: config.table_argument.allow_multiple,
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use sail_common::config::TableArgumentConfig;

    use super::*;
    use crate::error::PlanError;

    #[test]
    fn test_plan_config_new() {
        Jail::expect_with(|jail| {
            let config = PlanConfig::new().map_err(|e| e.to_string())?;
            assert_eq!(config, PlanConfig::default());

            jail.set_env("SAIL__TABLE_ARGUMENT__HASH_PARTITIONS", "12");
            let config = PlanConfig::new().map_err(|e| e.to_string())?;
            assert_eq!(config.hash_partitions, Some(12));
            assert!(config.allow_multiple_table_arguments);

            jail.set_env("SAIL__TABLE_ARGUMENT__HASH_PARTITIONS", "zero");
            let result = PlanConfig::new();
            assert!(matches!(result, Err(PlanError::InvalidArgument(_))));
            Ok(())
        });
    }

    #[test]
    fn test_plan_config_from_app_config() {
        let config = AppConfig {
            table_argument: TableArgumentConfig {
                hash_partitions: 0,
                allow_multiple: true,
            },
        };
        assert_eq!(PlanConfig::from(&config), PlanConfig::default());

        let config = AppConfig {
            table_argument: TableArgumentConfig {
                hash_partitions: 16,
                allow_multiple: false,
            },
        };
        assert_eq!(
            PlanConfig::from(&config),
            PlanConfig {
                hash_partitions: Some(16),
                allow_multiple_table_arguments: false,
            }
        );
    }
}
