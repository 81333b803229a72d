//! Service error type shared by models, services and controllers.
//!
//! Every failure that crosses a layer boundary is a `ServiceError`; controllers
//! either map it themselves or let the `ResponseError` impl render it.

use std::collections::HashMap;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Structured context attached to an error: a tag naming the subsystem,
/// an optional detail string and free-form metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl ErrorContext {
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    #[error("{message}")]
    BadRequest { message: String, context: ErrorContext },
    #[error("{message}")]
    Unauthorized { message: String, context: ErrorContext },
    #[error("{message}")]
    NotFound { message: String, context: ErrorContext },
    #[error("{message}")]
    Conflict { message: String, context: ErrorContext },
    #[error("{message}")]
    UnprocessableEntity { message: String, context: ErrorContext },
    #[error("{message}")]
    InternalServerError { message: String, context: ErrorContext },
}

macro_rules! constructor {
    ($name:ident, $variant:ident) => {
        pub fn $name(message: impl Into<String>) -> Self {
            ServiceError::$variant {
                message: message.into(),
                context: ErrorContext::default(),
            }
        }
    };
}

impl ServiceError {
    constructor!(bad_request, BadRequest);
    constructor!(unauthorized, Unauthorized);
    constructor!(not_found, NotFound);
    constructor!(conflict, Conflict);
    constructor!(unprocessable_entity, UnprocessableEntity);
    constructor!(internal_server_error, InternalServerError);

    pub fn message(&self) -> &str {
        match self {
            ServiceError::BadRequest { message, .. }
            | ServiceError::Unauthorized { message, .. }
            | ServiceError::NotFound { message, .. }
            | ServiceError::Conflict { message, .. }
            | ServiceError::UnprocessableEntity { message, .. }
            | ServiceError::InternalServerError { message, .. } => message,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            ServiceError::BadRequest { context, .. }
            | ServiceError::Unauthorized { context, .. }
            | ServiceError::NotFound { context, .. }
            | ServiceError::Conflict { context, .. }
            | ServiceError::UnprocessableEntity { context, .. }
            | ServiceError::InternalServerError { context, .. } => context,
        }
    }

    /// Rebuild this error with a transformed context.
    pub fn with_context<F>(self, f: F) -> Self
    where
        F: FnOnce(ErrorContext) -> ErrorContext,
    {
        match self {
            ServiceError::BadRequest { message, context } => ServiceError::BadRequest {
                message,
                context: f(context),
            },
            ServiceError::Unauthorized { message, context } => ServiceError::Unauthorized {
                message,
                context: f(context),
            },
            ServiceError::NotFound { message, context } => ServiceError::NotFound {
                message,
                context: f(context),
            },
            ServiceError::Conflict { message, context } => ServiceError::Conflict {
                message,
                context: f(context),
            },
            ServiceError::UnprocessableEntity { message, context } => {
                ServiceError::UnprocessableEntity {
                    message,
                    context: f(context),
                }
            }
            ServiceError::InternalServerError { message, context } => {
                ServiceError::InternalServerError {
                    message,
                    context: f(context),
                }
            }
        }
    }

    pub fn with_tag(self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.with_context(|ctx| ctx.with_tag(tag))
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.with_context(|ctx| ctx.with_detail(detail))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<&'a str>,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict { .. } => StatusCode::CONFLICT,
            ServiceError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.message(),
            tag: self.context().tag.as_deref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_map_to_status_codes() {
        assert_eq!(
            ServiceError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::conflict("x").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::unprocessable_entity("x").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn context_accumulates() {
        let err = ServiceError::bad_request("bad")
            .with_tag("nfe")
            .with_context(|ctx| ctx.with_detail("detail").with_metadata("campo", "numero"));

        assert_eq!(err.message(), "bad");
        assert_eq!(err.context().tag.as_deref(), Some("nfe"));
        assert_eq!(err.context().detail.as_deref(), Some("detail"));
        assert_eq!(
            err.context().metadata.get("campo").map(String::as_str),
            Some("numero")
        );
    }
}
