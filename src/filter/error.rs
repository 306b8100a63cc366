use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid filters parameter: {0}")]
    InvalidFilter(String),

    #[error("Invalid date value '{0}': expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate(String),
}
