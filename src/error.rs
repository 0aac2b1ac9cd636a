//! Error and fallback types.
//!
//! Two layers:
//! - `MonitorError`: plumbing failures (config, network, decoding, IO).
//! - `Degradation` + `Estimate<T>`: estimator outcomes that fell back to a
//!   documented conservative default instead of aborting the run.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type MonitorResult<T> = Result<T, MonitorError>;

impl MonitorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Data(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Why an estimator returned its fallback value.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    #[error("insufficient data: need {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("missing market field: {field}")]
    MissingMarketField { field: String },

    #[error("ill-defined greek: {detail}")]
    IllDefinedGreek { detail: String },

    #[error("upstream unavailable: {detail}")]
    UpstreamUnavailable { detail: String },
}

impl Degradation {
    pub fn insufficient(needed: usize, got: usize) -> Self {
        Self::InsufficientData { needed, got }
    }

    pub fn upstream(detail: impl Into<String>) -> Self {
        Self::UpstreamUnavailable { detail: detail.into() }
    }

    pub fn ill_defined_greek(detail: impl Into<String>) -> Self {
        Self::IllDefinedGreek { detail: detail.into() }
    }
}

/// Result of an estimator: either a genuinely computed value or the
/// conservative default it degraded to, with the reason attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Estimate<T> {
    Computed { value: T },
    Fallback { value: T, reason: Degradation },
}

impl<T> Estimate<T> {
    pub fn computed(value: T) -> Self {
        Self::Computed { value }
    }

    pub fn fallback(value: T, reason: Degradation) -> Self {
        Self::Fallback { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Computed { value } | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Computed { value } | Self::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&Degradation> {
        match self {
            Self::Computed { .. } => None,
            Self::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Estimate<U> {
        match self {
            Self::Computed { value } => Estimate::Computed { value: f(value) },
            Self::Fallback { value, reason } => Estimate::Fallback { value: f(value), reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_keeps_value_and_reason() {
        let est = Estimate::fallback(0.5, Degradation::insufficient(40, 10));
        assert!(est.is_fallback());
        assert_eq!(*est.value(), 0.5);
        assert_eq!(est.reason(), Some(&Degradation::InsufficientData { needed: 40, got: 10 }));
    }

    #[test]
    fn estimate_serializes_with_status_tag() {
        let est = Estimate::fallback(0.3, Degradation::upstream("no chains"));
        let json = serde_json::to_value(&est).unwrap();
        assert_eq!(json["status"], "fallback");
        assert_eq!(json["reason"]["kind"], "upstream_unavailable");

        let ok = serde_json::to_value(Estimate::computed(1.0)).unwrap();
        assert_eq!(ok["status"], "computed");
        assert_eq!(ok["value"], 1.0);
    }
}
