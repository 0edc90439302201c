use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sqlx::Error as SqlxError;
use std::env::VarError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Uniqueness(String),

    #[error("Despesa inexistente ou já paga")]
    NotFoundOrAlreadyPaid,

    #[error("Acesso negado")]
    AccessDenied,

    #[error("Não encontrado")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Identity error: {0}")]
    Identity(#[from] actix_identity::error::GetIdentityError),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Password error: {0}")]
    Password(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] VarError),
}

impl AppError {
    /// Domain failures the user can fix by correcting their input; handlers
    /// catch these and re-render the page with the message instead of letting
    /// them escape as an error response.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::Uniqueness(_) | AppError::NotFoundOrAlreadyPaid
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Uniqueness(_) => StatusCode::CONFLICT,
            AppError::NotFoundOrAlreadyPaid => StatusCode::CONFLICT,
            AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}

impl From<AppError> for std::io::Error {
    fn from(err: AppError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}
