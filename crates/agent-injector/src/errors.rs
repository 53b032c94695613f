use axum::http::StatusCode;
use thiserror::Error;

/// The body of a request is not a valid admission review envelope.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(#[source] pub serde_json::Error);

/// Reasons why an admission request cannot be turned into a decision.
///
/// Each variant is reported back to the API server inside of the response
/// envelope, see [`AdmissionError::code`].
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no request found inside of the admission review")]
    MissingRequest,

    #[error("no handler for path {0}")]
    UnknownPath(String),

    #[error("Can't handle the kind({0}) object")]
    UnsupportedKind(String),

    #[error("no object found inside of the admission request")]
    MissingObject,

    #[error("{0}")]
    Unmarshal(#[source] serde_json::Error),

    #[error("{0}")]
    PatchSerialization(#[source] serde_json::Error),
}

impl AdmissionError {
    /// HTTP code written into the `status` of the admission response.
    pub fn code(&self) -> StatusCode {
        match self {
            AdmissionError::Decode(_)
            | AdmissionError::MissingRequest
            | AdmissionError::UnknownPath(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AdmissionError::UnsupportedKind(_)
            | AdmissionError::MissingObject
            | AdmissionError::Unmarshal(_)
            | AdmissionError::PatchSerialization(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    }

    #[rstest]
    #[case::decode(AdmissionError::Decode(DecodeError(json_error())), 500)]
    #[case::missing_request(AdmissionError::MissingRequest, 500)]
    #[case::unknown_path(AdmissionError::UnknownPath("/validate".to_owned()), 500)]
    #[case::unsupported_kind(AdmissionError::UnsupportedKind("Pod".to_owned()), 400)]
    #[case::missing_object(AdmissionError::MissingObject, 400)]
    #[case::unmarshal(AdmissionError::Unmarshal(json_error()), 400)]
    #[case::patch_serialization(AdmissionError::PatchSerialization(json_error()), 400)]
    fn status_codes(#[case] error: AdmissionError, #[case] expected: u16) {
        assert_eq!(error.code().as_u16(), expected);
    }

    #[test]
    fn unsupported_kind_message() {
        let error = AdmissionError::UnsupportedKind("Pod".to_owned());
        assert_eq!(error.to_string(), "Can't handle the kind(Pod) object");
    }
}
