//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) => crate::exitcode::USAGE,
                    ApplicationError::DatasetNotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::Dataset { .. } => crate::exitcode::DATAERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::SOFTWARE,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use rstest::rstest;
    use std::path::PathBuf;

    #[rstest]
    #[case(CliError::Usage("x".into()), crate::exitcode::USAGE)]
    #[case(ApplicationError::Domain(DomainError::EmptyQuery).into(), crate::exitcode::USAGE)]
    #[case(ApplicationError::DatasetNotFound(PathBuf::from("a.json")).into(), crate::exitcode::NOINPUT)]
    #[case(
        ApplicationError::Dataset { path: PathBuf::from("a.json"), message: "bad".into() }.into(),
        crate::exitcode::DATAERR
    )]
    #[case(ApplicationError::Config { message: "bad".into() }.into(), crate::exitcode::CONFIG)]
    #[case(
        InfraError::io("write", std::io::Error::new(std::io::ErrorKind::Other, "x")).into(),
        crate::exitcode::IOERR
    )]
    fn given_error_when_mapping_then_sysexits_code(#[case] err: CliError, #[case] expected: i32) {
        assert_eq!(err.exit_code(), expected);
    }
}
