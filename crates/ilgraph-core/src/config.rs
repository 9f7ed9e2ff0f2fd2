//! Analysis defaults, optionally overridden from the environment.

use crate::query::guards::{
    clamp_depth, clamp_page_size, clamp_path_length, DEFAULT_CALL_DEPTH, DEFAULT_PAGE_SIZE,
    DEFAULT_PATH_LENGTH, MAX_CALL_DEPTH, MAX_PAGE_SIZE, MAX_PATH_LENGTH,
};

pub const ENV_PAGE_SIZE: &str = "ILGRAPH_PAGE_SIZE";
pub const ENV_CALL_DEPTH: &str = "ILGRAPH_CALL_DEPTH";
pub const ENV_PATH_LENGTH: &str = "ILGRAPH_PATH_LENGTH";
pub const ENV_INCLUDE_PRIVATE: &str = "ILGRAPH_INCLUDE_PRIVATE";

/// Limits applied when a caller leaves a parameter unspecified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub page_size: usize,
    pub call_depth: u32,
    pub path_length: usize,
    pub include_private: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE as usize,
            call_depth: DEFAULT_CALL_DEPTH as u32,
            path_length: DEFAULT_PATH_LENGTH as usize,
            include_private: false,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values keep the
    /// default; numeric values are clamped to the guard ceilings.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let int = |key: &str| lookup(key).and_then(|v| v.trim().parse::<i64>().ok());
        Self {
            page_size: int(ENV_PAGE_SIZE)
                .map(|v| clamp_page_size(v, MAX_PAGE_SIZE))
                .unwrap_or(defaults.page_size),
            call_depth: int(ENV_CALL_DEPTH)
                .map(|v| clamp_depth(v, MAX_CALL_DEPTH))
                .unwrap_or(defaults.call_depth),
            path_length: int(ENV_PATH_LENGTH)
                .map(|v| clamp_path_length(v, MAX_PATH_LENGTH))
                .unwrap_or(defaults.path_length),
            include_private: lookup(ENV_INCLUDE_PRIVATE)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.include_private),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    let v = value.trim().to_lowercase();
    match v.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
