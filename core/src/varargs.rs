//! Trailing `name=value` tokens.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::VarargsError;

/// Per-pair validator. The `Err` message is reported as
/// [`VarargsError::Validation`].
pub type VarargValidator = Arc<dyn Fn(&str, &str) -> Result<(), String> + Send + Sync>;

/// Whether a command accepts trailing `name=value` tokens.
#[derive(Clone, Default)]
pub enum VarargsConfig {
    #[default]
    Disabled,
    Enabled {
        required: bool,
        validator: Option<VarargValidator>,
    },
}

impl fmt::Debug for VarargsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Enabled {
                required,
                validator,
            } => f
                .debug_struct("Enabled")
                .field("required", required)
                .field("validator", &validator.is_some())
                .finish(),
        }
    }
}

impl From<bool> for VarargsConfig {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::optional()
        } else {
            Self::Disabled
        }
    }
}

impl VarargsConfig {
    pub fn optional() -> Self {
        Self::Enabled {
            required: false,
            validator: None,
        }
    }

    pub fn required() -> Self {
        Self::Enabled {
            required: true,
            validator: None,
        }
    }

    /// Attaches a validator; enables varargs if they were disabled.
    pub fn with_validator<F>(self, validator: F) -> Self
    where
        F: Fn(&str, &str) -> Result<(), String> + Send + Sync + 'static,
    {
        let required = self.is_required();
        Self::Enabled {
            required,
            validator: Some(Arc::new(validator)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Self::Enabled { required: true, .. })
    }

    /// Usage placeholder, bracketed when optional.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Disabled => None,
            Self::Enabled { required: true, .. } => Some("name=value..."),
            Self::Enabled { required: false, .. } => Some("[name=value...]"),
        }
    }

    /// Partitions leftover tokens into a `name → value` map.
    ///
    /// Each token is split on its first `=`; the value may itself contain
    /// `=`. Returns an empty map when varargs are disabled.
    ///
    /// # Errors
    ///
    /// - [`VarargsError::InvalidVarargsFormat`] for a token without `=` or
    ///   with an empty name.
    /// - [`VarargsError::DuplicateVararg`] when a name repeats.
    /// - [`VarargsError::Validation`] when the validator rejects a pair.
    /// - [`VarargsError::VarargsRequired`] when required and no tokens remain.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_kit_core::{VarargsConfig, VarargsError};
    ///
    /// let config = VarargsConfig::required();
    /// let tokens = vec!["foo=bar".to_string(), "foo=baz".to_string()];
    /// assert_eq!(
    ///     config.parse(&tokens),
    ///     Err(VarargsError::DuplicateVararg("foo".into()))
    /// );
    /// ```
    pub fn parse(&self, tokens: &[String]) -> Result<BTreeMap<String, String>, VarargsError> {
        let Self::Enabled {
            required,
            validator,
        } = self
        else {
            return Ok(BTreeMap::new());
        };

        let mut pairs = BTreeMap::new();
        for token in tokens {
            let (name, value) = token
                .split_once('=')
                .filter(|(name, _)| !name.is_empty())
                .ok_or_else(|| VarargsError::InvalidVarargsFormat(token.clone()))?;

            if pairs.contains_key(name) {
                return Err(VarargsError::DuplicateVararg(name.to_string()));
            }
            if let Some(validator) = validator {
                validator(name, value).map_err(|message| VarargsError::Validation {
                    key: name.to_string(),
                    message,
                })?;
            }
            pairs.insert(name.to_string(), value.to_string());
        }

        if *required && pairs.is_empty() {
            return Err(VarargsError::VarargsRequired);
        }

        Ok(pairs)
    }
}
