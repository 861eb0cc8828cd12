//! Layered configuration resolution.
//!
//! Resolution is a fold over an ordered list of [`Layer`]s starting from
//! [`Config::default`]. Each layer receives the configuration produced by the
//! previous one and overwrites only the fields it explicitly provides.
//!
//! | order | layer          | failure                        |
//! |-------|----------------|--------------------------------|
//! | 1     | defaults       | n/a                            |
//! | 2     | [`FileLayer`]  | fatal, resolution stops        |
//! | 3     | [`EnvLayer`]   | per field, value kept          |

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::{
    sources::{decode_file, EnvField, EnvSource},
    Config, ConfigError,
};
use crate::print_warn;

/// One source of configuration values.
pub trait Layer {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Returns `config` with this layer's values applied on top.
    fn apply(&self, config: Config) -> Result<Config, ConfigError>;
}

/// Overlays the contents of a configuration file.
#[derive(Debug, Clone)]
pub struct FileLayer {
    path: PathBuf,
}

impl FileLayer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Layer for FileLayer {
    fn name(&self) -> &'static str {
        "file"
    }

    fn apply(&self, config: Config) -> Result<Config, ConfigError> {
        let overlay = decode_file(&self.path)?;
        let base = serde_json::to_value(&config)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        serde_json::from_value(deep_merge(base, overlay)).map_err(|e| ConfigError::ParseError {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

/// Applies `GOBOT_BME280_*` overrides.
///
/// Unset or empty variables are skipped. A variable that fails conversion is
/// reported and skipped; the remaining fields are still applied.
pub struct EnvLayer<'a, E: EnvSource + ?Sized> {
    env: &'a E,
}

impl<'a, E: EnvSource + ?Sized> EnvLayer<'a, E> {
    pub fn new(env: &'a E) -> Self {
        Self { env }
    }
}

impl<E: EnvSource + ?Sized> Layer for EnvLayer<'_, E> {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn apply(&self, mut config: Config) -> Result<Config, ConfigError> {
        for field in EnvField::ALL {
            let Some(raw) = self.env.var(&field.env_name()).filter(|v| !v.is_empty()) else {
                continue;
            };

            if let Err(e) = field.apply(&mut config, &raw) {
                print_warn!("{}, keeping previous value", e);
            }
        }

        Ok(config)
    }
}

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans are replaced entirely
/// - If overlay is null, the base value is preserved (null means "not specified")
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Folds `layers` over `initial`, stopping at the first fatal error.
pub fn apply_layers(initial: Config, layers: &[&dyn Layer]) -> Result<Config, ConfigError> {
    layers.iter().try_fold(initial, |config, layer| {
        debug!("Applying {} configuration layer", layer.name());
        layer.apply(config)
    })
}

/// Resolves the effective configuration from defaults, an optional file and `env`.
///
/// An absent or empty `path` skips the file layer. The result is not validated.
pub fn resolve<E: EnvSource + ?Sized>(
    path: Option<&Path>,
    env: &E,
) -> Result<Config, ConfigError> {
    let file = path
        .filter(|p| !p.as_os_str().is_empty())
        .map(FileLayer::new);
    let env = EnvLayer::new(env);

    let mut layers: Vec<&dyn Layer> = Vec::with_capacity(2);
    if let Some(file) = &file {
        layers.push(file);
    }
    layers.push(&env);

    apply_layers(Config::default(), &layers)
}
