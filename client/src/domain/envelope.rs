//! Uniform success/failure envelope for wrapped backend operations.
//!
//! Wire form: `{ "success": true, "data": ... }` or
//! `{ "success": false, "error": "..." }`. Callers reach the payload only by
//! matching on the variant.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::DomainError;

/// Tagged outcome of a wrapped backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<T> {
    /// The operation succeeded with a payload.
    Success(T),
    /// The operation failed with a human-readable message.
    Failure {
        /// Message taken from the backend, possibly empty.
        message: String,
    },
}

impl<T> Envelope<T> {
    /// Wrap a payload.
    pub const fn success(data: T) -> Self {
        Self::Success(data)
    }

    /// Wrap a failure message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Whether this is the success variant.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Payload of a success.
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Message of a failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { message } => Some(message.as_str()),
        }
    }

    /// Convert into a `Result`, using `fallback` when the failure message is
    /// blank.
    ///
    /// # Examples
    /// ```
    /// use marketplace_client::domain::Envelope;
    ///
    /// let failed: Envelope<u8> = Envelope::failure("");
    /// let err = failed.into_result("Failed to load profile").unwrap_err();
    /// assert_eq!(err.message(), "Failed to load profile");
    /// ```
    pub fn into_result(self, fallback: &str) -> Result<T, DomainError> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure { message } => Err(DomainError::backend_or(message, fallback)),
        }
    }

    /// Map the payload, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Self::Success(data) => Envelope::Success(f(data)),
            Self::Failure { message } => Envelope::Failure { message },
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Envelope<T> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(data) => Self::Success(data),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct EnvelopeDto<T> {
    success: bool,
    /// `Some` whenever the key is present, even when its value is `null`.
    #[serde(default, deserialize_with = "present")]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let view = match self {
            Self::Success(data) => EnvelopeRef {
                success: true,
                data: Some(data),
                error: None,
            },
            Self::Failure { message } => EnvelopeRef {
                success: false,
                data: None,
                error: Some(message.as_str()),
            },
        };
        view.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dto = EnvelopeDto::<T>::deserialize(deserializer)?;
        match (dto.success, dto.data) {
            (true, Some(data)) => Ok(Self::Success(data)),
            (true, None) => Err(D::Error::custom("successful envelope must carry a data key")),
            (false, _) => Ok(Self::Failure {
                message: dto.error.unwrap_or_default(),
            }),
        }
    }
}
