use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;

/// Domain error taxonomy. Every variant carries the message surfaced to the
/// caller; the HTTP mapping lives in `status_code`.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    /// Operation requested from the wrong lifecycle state, e.g. closing a
    /// period that is not PAID. 400 like validation, kept separate so the
    /// intent shows up in logs.
    #[display(fmt = "{}", _0)]
    IllegalState(String),

    #[display(fmt = "Internal Server Error")]
    Database(sqlx::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::IllegalState(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Database(e) = self {
            tracing::error!(error = %e, "Database error");
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": {
                "message": self.to_string(),
                "statusCode": self.status_code().as_u16(),
            }
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

/// Translate a unique-index violation into the domain conflict error; any
/// other database failure passes through untouched.
pub fn on_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}
