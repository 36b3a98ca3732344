use std::path::PathBuf;

/// Where the console keeps its rule sets and which one to open first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Use a SQLite library file instead of the JSON directory.
    pub sqlite: Option<PathBuf>,
    pub open: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            sqlite: None,
            open: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} expects a value")]
    MissingValue(String),

    #[error("unknown argument {0}")]
    UnknownFlag(String),
}

impl AppConfig {
    /// Parse command-line arguments (without the program name).
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = AppConfig::default();
        let mut iter = args.into_iter().map(Into::<String>::into);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--data" => config.data_dir = PathBuf::from(flag_value(&mut iter, &arg)?),
                "--sqlite" => config.sqlite = Some(PathBuf::from(flag_value(&mut iter, &arg)?)),
                "--open" => config.open = Some(flag_value(&mut iter, &arg)?),
                _ => return Err(ConfigError::UnknownFlag(arg)),
            }
        }
        Ok(config)
    }
}

fn flag_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, ConfigError> {
    iter.next()
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}
