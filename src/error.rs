use thiserror;

use std;
use std::fmt::Display;

use serde::ser;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// The signature does not parse as a sequence of complete types.
    #[error("failed to parse signature \"{signature}\" at offset {offset}: {msg}")]
    Parse {
        signature: String,
        offset: usize,
        msg: String,
    },

    /// A value does not fit the type it is being transformed into.
    #[error("value {value} for parameter {param} is unacceptable: {msg}")]
    UnexpectedValue {
        value: String,
        param: &'static str,
        msg: String,
    },

    /// No signature can be computed for a typed value.
    #[error("cannot compute a signature for {value}: {msg}")]
    Signature { value: String, msg: String },

    #[error("error serializing: {0}")]
    Serializing(String),
}

impl Error {
    pub(crate) fn parse(signature: &str, offset: usize, msg: impl Into<String>) -> Self {
        Error::Parse {
            signature: signature.to_owned(),
            offset,
            msg: msg.into(),
        }
    }

    pub(crate) fn unexpected(
        value: impl Display,
        param: &'static str,
        msg: impl Into<String>,
    ) -> Self {
        Error::UnexpectedValue {
            value: value.to_string(),
            param,
            msg: msg.into(),
        }
    }

    /// True if the error happened while turning a signature into
    /// transformers, rather than while applying one.
    pub fn is_generation_error(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Serializing(msg.to_string())
    }
}
