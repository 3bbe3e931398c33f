use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request to the gateway failed: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
