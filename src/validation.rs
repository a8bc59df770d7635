// src/validation.rs

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::errors::{ApiError, Issue};

/// JSON body that has passed its `Validate` constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(rejection_issue)?;
        validate(value).map(ValidatedJson)
    }
}

/// Path parameters. A segment that does not parse is a `ValidationFailed` issue.
#[derive(Debug, Clone, Copy)]
pub struct PathParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(PathParams(value)),
            Err(rejection) => Err(path_issue(rejection)),
        }
    }
}

/// Query string, reported like [`PathParams`] when it does not parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(query_issue(rejection)),
        }
    }
}

/// Run the constraints of `value`, turning failures into `ValidationFailed`.
pub fn validate<T: Validate>(value: T) -> Result<T, ApiError> {
    value.validate().map_err(|e| ApiError::ValidationFailed(issues(&e)))?;
    Ok(value)
}

fn root_issue(code: &str, message: String) -> ApiError {
    ApiError::ValidationFailed(vec![Issue {
        path: String::new(),
        code: code.to_string(),
        message,
    }])
}

/// A body that does not parse is reported as a single root issue.
pub fn rejection_issue(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge;
    }
    root_issue("invalid_body", rejection.body_text())
}

fn path_issue(rejection: PathRejection) -> ApiError {
    if rejection.status().is_server_error() {
        return ApiError::Internal(rejection.body_text());
    }
    root_issue("invalid_path", rejection.body_text())
}

fn query_issue(rejection: QueryRejection) -> ApiError {
    root_issue("invalid_query", rejection.body_text())
}

/// Flatten `ValidationErrors` into path/code/message issues, sorted by path.
pub fn issues(errors: &ValidationErrors) -> Vec<Issue> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<Issue>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    out.push(Issue {
                        path: path.clone(),
                        code: err.code.to_string(),
                        message: err
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid {}", path)),
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{}.{}", path, index), out);
                }
            }
        }
    }
}
