use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::error::AppError;

/// Acting-user identity forwarded by the gateway in the `x-user-id` header.
/// Treated as an opaque audit string; the payroll core performs no
/// authentication of its own.
pub struct ActingUser(pub Option<String>);

impl ActingUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Approve/close style actions must record who acted.
    pub fn require(&self) -> Result<&str, AppError> {
        self.0.as_deref().ok_or_else(|| {
            AppError::Validation("x-user-id header is required for this action".to_string())
        })
    }
}

impl FromRequest for ActingUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .headers()
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        ready(Ok(ActingUser(user)))
    }
}
