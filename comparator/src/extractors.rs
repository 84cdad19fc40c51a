use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::CompositeError;
use common::{ErrorCode, ValidateFrom};

/// JSON body deserialized into `T::Input` then validated into `T`.
///
/// Any rejection, from a missing content type to a failed field check, is a
/// `400` carrying `T::REJECTION` as its message.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: ValidateFrom + Send,
    T::Input: DeserializeOwned + Send,
{
    type Rejection = CompositeError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(input) = Json::<T::Input>::from_request(req, state)
            .await
            .map_err(|e| {
                let mut err = CompositeError::new(ErrorCode::Ebadrequest, T::REJECTION);
                err.add_detail("body", ErrorCode::Ebadrequest, &e.body_text());
                err
            })?;

        let validated = T::validate_from(input)?;
        Ok(Self(validated))
    }
}
