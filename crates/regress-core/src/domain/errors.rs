use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RegressResult<T> = Result<T, RegressError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegressErrorCategory {
    InputValidationError,
    IoSystemError,
    InternalError,
}

impl RegressErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::InternalError => "InternalError",
        }
    }
}

/// Infrastructure failure that aborts the whole run.
///
/// Test-level anomalies never become a `RegressError`; they are counted as
/// warnings or failures by the evaluator instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegressError {
    category: RegressErrorCategory,
    code: &'static str,
    message: String,
}

impl RegressError {
    pub fn new(
        category: RegressErrorCategory,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn input_validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(RegressErrorCategory::InputValidationError, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(RegressErrorCategory::IoSystemError, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(RegressErrorCategory::InternalError, code, message)
    }

    pub const fn category(&self) -> RegressErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for RegressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.code,
            self.message
        )
    }
}

impl Error for RegressError {}
