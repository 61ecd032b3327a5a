use std::fmt;

use serde::Deserialize;

/// Startup configuration, built once and never mutated afterwards.
///
/// Validation happens at the parse boundary (`from_args` / `from_file`), not
/// in the struct itself, so tests may construct a `Config` with port 0 to
/// bind an ephemeral port.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub port: u16,
    /// Response body served to every request. May be empty.
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    /// Wrong argument shape: missing port, extra positionals, dangling flag.
    Usage,
    /// Port outside 1..65535 or not a number. Carries the offending value.
    InvalidPort(String),
    /// Config file could not be read or parsed.
    File(String),
}

impl ConfigError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::Usage | ConfigError::File(_) => 1,
            ConfigError::InvalidPort(_) => 2,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Usage => write!(f, "Expected a port and an optional response body"),
            ConfigError::InvalidPort(raw) => {
                write!(f, "Port should be in 1..65535 range (got {raw:?})")
            }
            ConfigError::File(reason) => write!(f, "Failed to load config file: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Builds a config from command-line arguments (program name already
    /// stripped). `-v`/`--verbose` may appear anywhere; `--config <file>`
    /// replaces the positional form entirely.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut verbose = false;
        let mut config_path = None;
        let mut positional = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-v" | "--verbose" => verbose = true,
                "--config" => {
                    config_path = Some(args.next().ok_or(ConfigError::Usage)?);
                }
                _ => positional.push(arg),
            }
        }

        if let Some(path) = config_path {
            if !positional.is_empty() {
                return Err(ConfigError::Usage);
            }
            let mut config = Self::from_file(&path)?;
            config.verbose |= verbose;
            return Ok(config);
        }

        if positional.is_empty() || positional.len() > 2 {
            return Err(ConfigError::Usage);
        }

        let port = parse_port(&positional[0])?;
        let body = positional.get(1).cloned().unwrap_or_default();

        Ok(Self {
            port,
            body,
            verbose,
        })
    }

    /// Loads a config from a YAML file (keys: `port`, `body`, `verbose`).
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::File(format!("{path}: {e}")))?;
        let config: Config =
            serde_yaml::from_str(&raw).map_err(|e| ConfigError::File(format!("{path}: {e}")))?;
        if config.port == 0 {
            return Err(ConfigError::InvalidPort("0".to_string()));
        }
        Ok(config)
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidPort(raw.to_string())),
        Ok(port) => Ok(port),
    }
}
