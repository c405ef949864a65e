use std::{path::PathBuf, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_BOARD_SIZE: usize = 50;
pub const DEFAULT_PERIOD_DURATION: Duration = Duration::from_millis(1600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    /// delay between two generations while running.
    pub period_duration: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOARD_SIZE,
            height: DEFAULT_BOARD_SIZE,
            period_duration: DEFAULT_PERIOD_DURATION,
        }
    }
}

impl EngineConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyBoard {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

/// Command line: `lifeboard [PATTERN] [--width N] [--height N] [--period MS]`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub pattern: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Options {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ConfigError> {
        let mut options = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--width" => options.engine.width = parse_value(&arg, args.next())?,
                "--height" => options.engine.height = parse_value(&arg, args.next())?,
                "--period" => {
                    let millis = parse_value(&arg, args.next())?;
                    options.engine.period_duration = Duration::from_millis(millis);
                }
                flag if flag.starts_with("--") => {
                    return Err(ConfigError::UnknownOption(flag.to_string()))
                }
                _ if options.pattern.is_some() => return Err(ConfigError::ExtraArgument),
                _ => options.pattern = Some(PathBuf::from(&arg)),
            }
        }
        options.engine = options.engine.validate()?;
        Ok(options)
    }
}

fn parse_value<T: std::str::FromStr>(option: &str, value: Option<String>) -> Result<T, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingValue(option.to_string()))?;
    value.parse().map_err(|_| ConfigError::InvalidValue {
        option: option.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, ConfigError> {
        Options::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn defaults() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.pattern, None);
        assert_eq!(options.engine.width, 50);
        assert_eq!(options.engine.height, 50);
        assert_eq!(options.engine.period_duration, Duration::from_millis(1600));
    }

    #[test]
    fn flags_and_pattern() {
        let options = parse(&["--width", "20", "glider.txt", "--period", "250", "--height", "10"]).unwrap();
        assert_eq!(options.pattern, Some(PathBuf::from("glider.txt")));
        assert_eq!(options.engine.width, 20);
        assert_eq!(options.engine.height, 10);
        assert_eq!(options.engine.period_duration, Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse(&["--width"]).unwrap_err(),
            ConfigError::MissingValue("--width".into())
        );
        assert_eq!(
            parse(&["--period", "soon"]).unwrap_err(),
            ConfigError::InvalidValue {
                option: "--period".into(),
                value: "soon".into()
            }
        );
        assert_eq!(
            parse(&["--speed", "2"]).unwrap_err(),
            ConfigError::UnknownOption("--speed".into())
        );
        assert_eq!(parse(&["a", "b"]).unwrap_err(), ConfigError::ExtraArgument);
        assert_eq!(
            parse(&["--height", "0"]).unwrap_err(),
            ConfigError::EmptyBoard {
                width: 50,
                height: 0
            }
        );
    }
}
