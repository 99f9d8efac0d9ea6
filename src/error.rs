use core::fmt;

/// Represents an error while assembling packets from a raw UMP word stream.
///
/// This type is a thin wrapper around `ErrorKind`: the word-stream reader
/// fails in few enough ways that a static reference to the kind is all an
/// error has to carry.
///
/// If the `std` feature is enabled, this type implements `std::error::Error`.
/// Otherwise, only `Display` and `Debug` are implemented.
///
/// For more information about the error policy used by `umply`, see
/// [`ErrorKind`](enum.ErrorKind.html).
#[derive(Clone)]
pub struct Error {
    inner: &'static ErrorKind,
}
impl Error {
    /// Create a new error with the given `ErrorKind`.
    #[inline]
    pub fn new(kind: &'static ErrorKind) -> Error {
        Error { inner: kind }
    }

    /// More information about the error itself.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        *self.inner
    }
}
impl From<&'static ErrorKind> for Error {
    #[inline]
    fn from(inner: &'static ErrorKind) -> Error {
        Error { inner }
    }
}
impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)
    }
}
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}
#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// The type of error that occurred while reading a word stream.
///
/// As a library consumer, detailed errors about what specific part of the UMP format was
/// violated are not very useful.
/// For this reason, errors are broadly categorized into 2 classes, and specific error info is
/// provided as a non-normative string literal.
#[derive(Copy, Clone, Debug)]
pub enum ErrorKind {
    /// Fatal errors while reading a word stream. The stream ends in the middle of a packet and
    /// no realignment is possible: whatever words remain cannot be interpreted.
    ///
    /// This error cannot be ignored, as there is not enough data to continue reading.
    Invalid(&'static str),

    /// Non-fatal error, but the stream clearly does not follow the UMP standard.
    ///
    /// This kind of error is not emitted by default, only if the `strict` crate feature is
    /// enabled.
    ///
    /// Ignoring these errors (if the `strict` feature is disabled) makes reserved packet types
    /// flow through untyped, which is usually what a bridge wants.
    Malformed(&'static str),
}
impl ErrorKind {
    /// Get the informative message on what exact part of the UMP format was not respected.
    #[inline]
    pub fn message(&self) -> &'static str {
        match *self {
            ErrorKind::Invalid(msg) => msg,
            ErrorKind::Malformed(msg) => msg,
        }
    }
}
impl fmt::Display for ErrorKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Invalid(msg) => write!(f, "invalid ump: {}", msg),
            ErrorKind::Malformed(msg) => write!(f, "malformed ump: {}", msg),
        }
    }
}

macro_rules! err_invalid {
    ($msg:expr) => {{
        const ERR_KIND: &'static ErrorKind = &ErrorKind::Invalid($msg);
        ERR_KIND
    }};
}
macro_rules! err_malformed {
    ($msg:expr) => {{
        const ERR_KIND: &'static ErrorKind = &ErrorKind::Malformed($msg);
        ERR_KIND
    }};
}

/// The result type used by the word-stream reader.
pub type Result<T> = StdResult<T, Error>;
pub(crate) use core::result::Result as StdResult;
