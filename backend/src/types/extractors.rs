//! Custom extractors that reject with the API error envelope

use aide::{operation::OperationInput, OperationOutput};
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use schemars::JsonSchema;

use crate::types::error::AppError;

/// JSON body extractor whose rejections are [`AppError`]s
pub struct JsonBody<T>(
    /// The deserialized body
    pub T,
);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: serde::de::DeserializeOwned + JsonSchema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| {
                if matches!(err, JsonRejection::MissingJsonContentType(_)) {
                    return AppError::bad_request("Missing Content-Type: application/json header");
                }
                tracing::warn!("Rejected JSON body: {err}");
                AppError::bad_request("Invalid JSON payload")
            })?;

        Ok(Self(payload))
    }
}

impl<T> OperationInput for JsonBody<T>
where
    T: JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        Json::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        // Rejections use the error envelope
        AppError::inferred_responses(ctx, operation)
    }
}
