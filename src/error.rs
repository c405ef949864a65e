use thiserror::Error;

use crate::Pos;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("cell ({}, {}) is outside the {width}x{height} board", .pos.x, .pos.y)]
    OutOfBounds { pos: Pos, width: usize, height: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("option `{0}` expects a value")]
    MissingValue(String),
    #[error("invalid value `{value}` for `{option}`")]
    InvalidValue { option: String, value: String },
    #[error("board dimensions must be positive, got {width}x{height}")]
    EmptyBoard { width: usize, height: usize },
    #[error("only one pattern path may be given")]
    ExtraArgument,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("the simulation thread is no longer running")]
    Disconnected,
}
