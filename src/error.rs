//! Errors reported while constructing and querying composite types.
//!
//! Every condition is an [`ErrorKind`]; an [`Error`] adds the source location of the
//! offending definition when it is known. User errors point at a mistake in a definition;
//! [`ErrorKind::Internal`] means a derived invariant did not hold, which is a defect here.

use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("{0}")]
    InvalidName(String),
    #[error("{0}")]
    InvalidVersion(String),
    #[error("{0}")]
    AttributeNameCollision(String),
    #[error("{0}")]
    InvalidFixedPortId(String),
    #[error("{0}")]
    MalformedUnion(String),
    #[error("{0}")]
    DeprecatedDependency(String),
    #[error("{0}")]
    InvalidExtent(String),
    /// Service types have no serialized form of their own.
    #[error("{0}")]
    NotSerializable(String),
    /// Attribute lookup by an unknown name (padding fields have no name).
    #[error("No such attribute: {0:?}")]
    UnknownAttribute(String),
    /// Bad parameters for a primitive, void or array type.
    #[error("{0}")]
    InvalidType(String),
    #[error("Internal error: {0} This is a bug in the DSDL compiler core, please report it.")]
    Internal(String),
}

/// An [`ErrorKind`] with an optional source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    path: Option<String>,
    line: Option<u32>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            kind,
            path: None,
            line: None,
        }
    }

    pub fn with_location(mut self, path: impl Into<String>, line: Option<u32>) -> Self {
        let path = path.into();
        self.path = (!path.is_empty()).then_some(path);
        self.line = line;
        self
    }

    /// Fills in the location only where it is still missing.
    pub fn set_location_if_unknown(&mut self, path: Option<&str>, line: Option<u32>) {
        if self.path.is_none() {
            self.path = path.filter(|p| !p.is_empty()).map(str::to_string);
        }
        if self.line.is_none() {
            self.line = line;
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// True if this is a defect in the compiler rather than in the definition.
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, ErrorKind::Internal(_))
    }

    pub(crate) fn internal(text: impl Into<String>) -> Self {
        Error::new(ErrorKind::Internal(text.into()))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

/// GCC-style: `path:line: message`, `path: message` or just `message`.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.line) {
            (Some(path), Some(line)) => write!(f, "{}:{}: {}", path, line, self.kind),
            (Some(path), None) => write!(f, "{}: {}", path, self.kind),
            _ => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let e = Error::new(ErrorKind::InvalidName("Hello world!".into()));
        assert_eq!(e.to_string(), "Hello world!");

        let e = e.with_location("path/to/file.dsdl", Some(123));
        assert_eq!(e.to_string(), "path/to/file.dsdl:123: Hello world!");

        let e = Error::new(ErrorKind::InvalidName("Hello world!".into()))
            .with_location("path/to/file.dsdl", None);
        assert_eq!(e.to_string(), "path/to/file.dsdl: Hello world!");
    }

    #[test]
    fn line_without_path_is_not_shown() {
        let mut e = Error::new(ErrorKind::InvalidExtent("bad".into()));
        e.set_location_if_unknown(None, Some(7));
        assert_eq!(e.line(), Some(7));
        assert_eq!(e.to_string(), "bad");
    }

    #[test]
    fn location_is_not_overwritten() {
        let mut e = Error::new(ErrorKind::InvalidVersion("v".into())).with_location("a.dsdl", Some(1));
        e.set_location_if_unknown(Some("b.dsdl"), Some(2));
        assert_eq!(e.path(), Some("a.dsdl"));
        assert_eq!(e.line(), Some(1));
    }

    #[test]
    fn internal_errors_are_distinguished() {
        let e = Error::internal("extent is not aligned");
        assert!(e.is_internal());
        assert!(e.to_string().contains("please report"));
        assert!(!Error::from(ErrorKind::MalformedUnion("x".into())).is_internal());
    }
}
