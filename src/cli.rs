use crate::config::WorkerConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config: Option<PathBuf>,
    seed: Option<u64>,
    viewport_width: Option<f32>,
    viewport_height: Option<f32>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "seed" => {
                    overrides.seed = Some(value.parse::<u64>().with_context(|| format!("Invalid seed '{value}'"))?);
                }
                "viewport-width" => overrides.viewport_width = Some(parse_dimension("viewport-width", &value)?),
                "viewport-height" => overrides.viewport_height = Some(parse_dimension("viewport-height", &value)?),
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --seed, --viewport-width, --viewport-height."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    pub fn into_config_overrides(self) -> WorkerConfigOverrides {
        WorkerConfigOverrides {
            seed: self.seed,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
        }
    }
}

fn parse_dimension(flag: &str, value: &str) -> Result<f32> {
    let parsed = value.parse::<f32>().with_context(|| format!("Invalid {flag} '{value}'"))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        bail!("Invalid {flag} '{value}'. Use a positive pixel size.");
    }
    Ok(parsed)
}
