use poem_openapi::{
    ApiResponse,
    payload::{Json, PlainText},
    types::ToJSON,
};
use tracing::{error, warn};

use crate::error::CsError;

#[derive(Debug, ApiResponse)]
pub enum ReadingApiResponse<T: ToJSON + Send> {
    #[oai(status = 200)]
    Ok(Json<T>),
    #[oai(status = 400)]
    ClientError(PlainText<String>),
    #[oai(status = 500)]
    InternalServerError(PlainText<String>),
}

impl<T: ToJSON + Send> From<Result<T, CsError>> for ReadingApiResponse<T> {
    fn from(result: Result<T, CsError>) -> Self {
        match result {
            Ok(value) => ReadingApiResponse::Ok(Json(value)),
            Err(e) if e.is_client_error() => {
                warn!("Rejected request: {e}");
                ReadingApiResponse::ClientError(PlainText(e.to_string()))
            }
            Err(e) => {
                error!("Request failed: {e}");
                ReadingApiResponse::InternalServerError(PlainText(e.to_string()))
            }
        }
    }
}
