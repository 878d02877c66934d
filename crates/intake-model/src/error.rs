use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("unknown canonical field: {0}")]
    UnknownField(String),
    #[error("unknown date order: {0}")]
    UnknownDateOrder(String),
}
