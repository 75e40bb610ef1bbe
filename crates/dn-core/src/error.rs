use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: String, value: f64 },

    #[error("Attribute '{attribute}' of node {node} is not numeric: '{value}'")]
    NotNumeric {
        node: String,
        attribute: String,
        value: String,
    },

    #[error("Invalid node id: {what}")]
    InvalidId { what: &'static str },
}
