use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported input format: {0}")]
    Format(String),

    #[error("missing required column(s): {0}")]
    Schema(String),

    #[error("non-numeric attendance value {0:?}")]
    Parse(String),

    #[error("message template: {0}")]
    Template(String),

    #[error("smtp authentication rejected: {0}")]
    Auth(String),

    #[error("mail transport failed: {0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
