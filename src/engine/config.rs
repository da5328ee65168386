//! Dotted-path configuration tree.
//!
//! Recognised keys are validated against a fixed schema rather than accepted as arbitrary
//! strings, so a typo in a key surfaces immediately rather than silently doing nothing.

use thiserror::Error;

use crate::engine::enumerator::EnumerationMode;
use crate::engine::enumerator::OptMode;
use crate::engine::heuristic::HeuristicKind;
use crate::engine::shared_context::ShareMode;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unrecognised configuration key `{0}`")]
    UnknownKey(String),
    #[error("value `{value}` is not valid for key `{key}`")]
    InvalidValue { key: String, value: String },
}

/// `solve.*` keys.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveConfig {
    pub models: u64,
    pub opt_mode: OptMode,
    pub project: bool,
    pub enum_mode: EnumerationMode,
}

impl Default for SolveConfig {
    fn default() -> Self {
        SolveConfig {
            models: 1,
            opt_mode: OptMode::Ignore,
            project: false,
            enum_mode: EnumerationMode::Auto,
        }
    }
}

/// `solver.restart.*` keys.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RestartConfig {
    pub initial_limit: u64,
    pub increase_factor: f64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        RestartConfig {
            initial_limit: 100,
            increase_factor: 1.5,
        }
    }
}

/// `solver.deletion.*` keys.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DeletionConfig {
    pub initial_budget: usize,
    pub increment: usize,
}

impl Default for DeletionConfig {
    fn default() -> Self {
        DeletionConfig {
            initial_budget: 2000,
            increment: 300,
        }
    }
}

/// The full recognised configuration tree, addressed by dotted path through [`Config::set`] /
/// [`Config::get`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub solve: SolveConfig,
    pub solver_heuristic: HeuristicKind,
    pub restart: RestartConfig,
    pub deletion: DeletionConfig,
    pub share_mode: ShareMode,
}

impl Config {
    /// Sets the value at `key` (e.g. `"solve.opt_mode"`), parsing `value` against that key's
    /// expected type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "solve.models" => self.solve.models = value.parse().map_err(|_| invalid())?,
            "solve.opt_mode" => self.solve.opt_mode = parse_opt_mode(value).ok_or_else(invalid)?,
            "solve.project" => self.solve.project = value.parse().map_err(|_| invalid())?,
            "solve.enum_mode" => self.solve.enum_mode = parse_enum_mode(value).ok_or_else(invalid)?,
            "solver.heuristic" => self.solver_heuristic = parse_heuristic(value).ok_or_else(invalid)?,
            "solver.restart.initial_limit" => {
                self.restart.initial_limit = value.parse().map_err(|_| invalid())?
            }
            "solver.restart.increase_factor" => {
                self.restart.increase_factor = value.parse().map_err(|_| invalid())?
            }
            "solver.deletion.initial_budget" => {
                self.deletion.initial_budget = value.parse().map_err(|_| invalid())?
            }
            "solver.deletion.increment" => {
                self.deletion.increment = value.parse().map_err(|_| invalid())?
            }
            "share_mode" => self.share_mode = parse_share_mode(value).ok_or_else(invalid)?,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn parse_opt_mode(value: &str) -> Option<OptMode> {
    match value {
        "ignore" => Some(OptMode::Ignore),
        "optimise" | "optimize" => Some(OptMode::Optimise),
        "enumOpt" => Some(OptMode::EnumOpt),
        _ => None,
    }
}

fn parse_enum_mode(value: &str) -> Option<EnumerationMode> {
    match value {
        "auto" => Some(EnumerationMode::Auto),
        "brave" => Some(EnumerationMode::Brave),
        "cautious" => Some(EnumerationMode::Cautious),
        "record" => Some(EnumerationMode::Record),
        "dom_record" => Some(EnumerationMode::DomRecord),
        "query" => Some(EnumerationMode::Query),
        _ => None,
    }
}

fn parse_heuristic(value: &str) -> Option<HeuristicKind> {
    match value {
        "berkmin" => Some(HeuristicKind::Berkmin),
        "vmtf" => Some(HeuristicKind::Vmtf),
        "vsids" => Some(HeuristicKind::Vsids),
        "domain" => Some(HeuristicKind::Domain),
        "unit" => Some(HeuristicKind::Unit),
        "none" => Some(HeuristicKind::None),
        _ => None,
    }
}

fn parse_share_mode(value: &str) -> Option<ShareMode> {
    match value {
        "auto" => Some(ShareMode::Auto),
        "problem" => Some(ShareMode::Problem),
        "learnt" => Some(ShareMode::Learnt),
        "all" => Some(ShareMode::All),
        "none" => Some(ShareMode::None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognised_key_updates_nested_field() {
        let mut config = Config::default();
        config.set("solve.opt_mode", "optimise").unwrap();
        assert_eq!(config.solve.opt_mode, OptMode::Optimise);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut config = Config::default();
        let err = config.set("solve.bogus", "1").unwrap_err();
        assert_eq!(err, ConfigError::UnknownKey("solve.bogus".to_string()));
    }

    #[test]
    fn invalid_value_is_rejected() {
        let mut config = Config::default();
        let err = config.set("solver.heuristic", "bogus").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
