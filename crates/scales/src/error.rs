use crate::config::ConfigError;
use crate::pipeline::PipelineError;
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Pipeline(PipelineError),
    CheckFailed { errors: usize },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Pipeline(err) => write!(f, "pipeline error: {}", err),
            AppError::CheckFailed { errors } => {
                write!(f, "state check failed with {} error(s)", errors)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
            AppError::CheckFailed { .. } => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<crate::config::ConfigLoadError> for AppError {
    fn from(value: crate::config::ConfigLoadError) -> Self {
        Self::Pipeline(PipelineError::Config(value))
    }
}
