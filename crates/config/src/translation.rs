use crate::ConfigError;

/// Limits applied to the types without a `@limit` directive.
#[derive(Default, Debug, PartialEq, serde::Deserialize, Clone, Copy)]
#[serde(default, deny_unknown_fields)]
pub struct TranslationConfig {
    /// Page size when a list is read without `limit` or `first`.
    pub default_limit: Option<u32>,
    /// Upper bound of any requested page size.
    pub max_limit: Option<u32>,
}

impl TranslationConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.default_limit == Some(0) || self.max_limit == Some(0) {
            return Err(ConfigError::Invalid("translation limits must be greater than 0".into()));
        }

        if let (Some(default), Some(max)) = (self.default_limit, self.max_limit) {
            if default > max {
                return Err(ConfigError::Invalid(format!(
                    "translation.default_limit ({default}) is greater than translation.max_limit ({max})"
                )));
            }
        }

        Ok(())
    }
}
