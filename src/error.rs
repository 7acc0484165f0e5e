//! Error type shared by every pipeline stage.
//!
//! Every fallible function returns `Result<_, AppError>`. The error carries a
//! coarse [`ErrorKind`] (which also decides the process exit code) and, once it
//! reaches the top-level handler, the [`Stage`] that failed.

use std::fmt;

/// Category of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Schema directory/file missing or malformed.
    Schema,
    /// Model configuration missing or unusable.
    Config,
    /// Input or output table fails schema checks.
    Validation,
    /// Context construction found empty groups or missing columns.
    Shape,
    /// Forecasting capability unavailable, failed, or returned a bad shape.
    Engine,
    /// Not enough future timestamps for the forecast horizon.
    Misalignment,
    /// Output or log could not be written.
    Persistence,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Shape => "ShapeError",
            ErrorKind::Engine => "EngineError",
            ErrorKind::Misalignment => "MisalignmentError",
            ErrorKind::Persistence => "PersistenceError",
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Schema | ErrorKind::Config => 2,
            ErrorKind::Validation | ErrorKind::Shape | ErrorKind::Misalignment => 3,
            ErrorKind::Engine => 4,
            ErrorKind::Persistence => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    LoadSchema,
    LoadModelConfig,
    LoadHistory,
    ValidateHistory,
    LoadFuture,
    ValidateFuture,
    BuildContext,
    Forecast,
    Assemble,
    ValidateOutput,
    Persist,
    Train,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::LoadSchema => "load schema",
            Stage::LoadModelConfig => "load model config",
            Stage::LoadHistory => "load historical data",
            Stage::ValidateHistory => "validate historical data",
            Stage::LoadFuture => "load future data",
            Stage::ValidateFuture => "validate future data",
            Stage::BuildContext => "build context",
            Stage::Forecast => "forecast",
            Stage::Assemble => "assemble output",
            Stage::ValidateOutput => "validate predictions",
            Stage::Persist => "save predictions",
            Stage::Train => "train",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    stage: Option<Stage>,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage: None,
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Shape, message)
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Engine, message)
    }

    pub fn misalignment(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Misalignment, message)
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence, message)
    }

    /// Record the stage this error came from. An earlier stage tag wins.
    pub fn at_stage(mut self, stage: Stage) -> Self {
        if self.stage.is_none() {
            self.stage = Some(stage);
        }
        self
    }

    /// Wrap this error for the top-level handler, naming the failed stage.
    ///
    /// The kind is kept so the exit code still reflects the underlying cause.
    pub fn wrap(self, task: &str) -> Self {
        let stage = self
            .stage
            .map(|s| format!(" (stage: {s})"))
            .unwrap_or_default();
        Self {
            kind: self.kind,
            stage: self.stage,
            message: format!(
                "Error occurred during {task}{stage}. Error: {}: {}",
                self.kind, self.message
            ),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("stage", &self.stage)
            .field("message", &self.message)
            .finish()
    }
}

/// Tag the error side of a `Result` with the stage that produced it.
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T, AppError>;
}

impl<T> StageContext<T> for Result<T, AppError> {
    fn stage(self, stage: Stage) -> Result<T, AppError> {
        self.map_err(|e| e.at_stage(stage))
    }
}
