use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Invalid country code: {0:?}")]
    InvalidCountryCode(String),

    #[error("Invalid user id: must not be empty")]
    EmptyUserId,

    #[error("Invalid search mode: {0:?} (expected \"prefix\" or \"substring\")")]
    InvalidMatchMode(String),
}
