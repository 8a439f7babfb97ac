//! Translation of API failures into user-facing diagnostics.
//!
//! Every controller reports a failed call the same way: a fixed prefix such
//! as `Error creating Application:` followed by whatever structure the error
//! carried, one field per indented line. Users search for these strings, so
//! the layout is stable.

use std::fmt::Write as _;

use crate::client::{ApiError, ProblemDetails, ValidationProblemDetails};
use crate::error::ProviderError;
use crate::schema::Diagnostic;

/// The structural shape of a failed call, as far as formatting is concerned.
#[derive(Debug, Clone, Copy)]
pub enum ErrorShape<'a> {
    /// Validation failure with per-field messages.
    ValidationProblem(&'a ValidationProblemDetails),
    /// Problem body without field errors.
    ProblemDetail(&'a ProblemDetails),
    /// A response status and nothing else.
    ApiStatusOnly(u16),
    /// Anything else. `None` when no error value was available at all.
    Unknown(Option<&'a ApiError>),
}

impl<'a> ErrorShape<'a> {
    /// Classify an error value.
    pub fn of(err: Option<&'a ApiError>) -> Self {
        match err {
            Some(ApiError::Validation(details)) => Self::ValidationProblem(details),
            Some(
                ApiError::Unauthorized(details)
                | ApiError::Forbidden(details)
                | ApiError::Conflict(details)
                | ApiError::Unprocessable(details),
            ) => Self::ProblemDetail(details),
            Some(ApiError::Status(code)) => Self::ApiStatusOnly(*code),
            Some(other) => Self::Unknown(Some(other)),
            None => Self::Unknown(None),
        }
    }

    /// Render the multi-line summary for this shape.
    pub fn summary(&self, prefix: &str) -> String {
        let mut out = String::from(prefix);
        match self {
            Self::ValidationProblem(details) => {
                push_common(&mut out, details.status, &details.title, &details.detail);
                if !details.errors.is_empty() {
                    out.push_str("\n\tErrors:");
                    for (name, messages) in &details.errors {
                        let _ = write!(out, "\n\t\t{}: [{}]", name, messages.join(" "));
                    }
                }
            },
            Self::ProblemDetail(details) => {
                push_common(&mut out, details.status, &details.title, &details.detail);
            },
            Self::ApiStatusOnly(code) => {
                let _ = write!(out, "\n\tStatus Code: {}", code);
            },
            Self::Unknown(Some(_)) => out.push_str("\n\tUnknown error"),
            Self::Unknown(None) => out.push_str("\n\tUnknown Error: (unavailable)"),
        }
        out
    }
}

fn push_common(
    out: &mut String,
    status: Option<i32>,
    title: &Option<String>,
    detail: &Option<String>,
) {
    if let Some(status) = status {
        let _ = write!(out, "\n\tStatus Code: {}", status);
    }
    if let Some(title) = title {
        let _ = write!(out, "\n\tTitle: {}", title);
    }
    if let Some(detail) = detail {
        let _ = write!(out, "\n\tDetail: {}", detail);
    }
}

/// Build the error diagnostic for a failed call.
///
/// Errors without a structured body keep their own text in the diagnostic
/// detail so transport failures and timeouts stay visible.
pub fn api_error_diagnostic(prefix: &str, err: Option<&ApiError>) -> Diagnostic {
    let shape = ErrorShape::of(err);
    let diagnostic = Diagnostic::error(shape.summary(prefix));
    match shape {
        ErrorShape::Unknown(Some(err)) => diagnostic.with_detail(err.to_string()),
        _ => diagnostic,
    }
}

/// Translate a failed call into a [`ProviderError`].
pub fn api_error(prefix: &str, err: ApiError) -> ProviderError {
    ProviderError::diagnostic(api_error_diagnostic(prefix, Some(&err)))
}
