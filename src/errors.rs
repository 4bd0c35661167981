use std::error;
use std::fmt;

use aws_sdk_dynamodb::types::SdkError;

/// Failures surfaced by the session store and the rendering step.
///
/// `SessionNotFound` maps to a 404; everything else is reported verbatim as a
/// 500 by the request handlers.
#[derive(Debug)]
pub enum Error {
    SessionNotFound(String),
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::SessionNotFound(session_id) => {
                write!(f, "no events found for session {}", session_id)
            }
            Error::Internal(details) => write!(f, "{}", details),
        }
    }
}

impl error::Error for Error {}

impl<E> From<SdkError<E>> for Error
where
    E: error::Error,
{
    fn from(value: SdkError<E>) -> Error {
        Error::Internal(format!("{}", value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Error {
        Error::Internal(format!("{}", value))
    }
}
