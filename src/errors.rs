use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TstInfoErrorKind {
    /// Declared length runs past the end of the buffer.
    Truncated,

    /// Malformed tag or length octets.
    InvalidHeader,

    /// Unexpected or missing tag.
    UnexpectedTag,

    /// Non-canonical or out-of-range INTEGER.
    InvalidInteger,

    /// Malformed OBJECT IDENTIFIER.
    InvalidOid,

    /// Malformed GeneralizedTime.
    InvalidGeneralizedTime,

    /// Non-canonical BOOLEAN.
    InvalidBoolean,

    /// Invalid Accuracy.
    InvalidAccuracy,

    /// Mandatory field present but empty.
    EmptyField,

    /// Unconsumed bytes after a complete structure.
    TrailingData,

    /// Nested structures exceed the depth limit.
    NestingTooDeep,

    /// Invalid ContentInfo.
    InvalidContentInfo,

    /// Invalid ContentType.
    InvalidContentType,

    /// Invalid SignedData.
    InvalidSignedData,

    /// Invalid Encapsulated ContentType.
    InvalidEncapsulatedContentType,

    /// Empty EncapsulatedContent.
    EmptyEncapsulatedContent,

    /// Unknown Error.
    Unknown,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TstInfoError {
    pub kind: TstInfoErrorKind,
    pub message: String,
}

impl TstInfoError {
    pub fn new(kind: TstInfoErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TstInfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{:?}", self.kind)
        } else {
            write!(f, "{:?}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for TstInfoError {}

pub trait TstInfoResult<T> {
    fn map_app_err(self, kind: TstInfoErrorKind) -> Result<T, TstInfoError>;
    fn map_unknown_err(self) -> Result<T, TstInfoError>;
}

impl<T, E> TstInfoResult<T> for std::result::Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn map_app_err(self, kind: TstInfoErrorKind) -> Result<T, TstInfoError> {
        self.map_err(|err| TstInfoError {
            kind,
            message: err.to_string(),
        })
    }

    fn map_unknown_err(self) -> Result<T, TstInfoError> {
        self.map_app_err(TstInfoErrorKind::Unknown)
    }
}
