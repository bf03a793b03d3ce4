/// Errors produced by the ZoneTouch 3 protocol library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A TCP connect, write or read failure. The console is spoken to with
    /// one connection per exchange, so any I/O problem surfaces here
    /// unchanged and unretried.
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),
    /// A decode asked for bytes beyond the end of the response buffer,
    /// for example a zone index the snapshot does not cover.
    #[error("byte range {offset}..{} exceeds buffer of {available} bytes", .offset + .length)]
    OutOfRange {
        offset: usize,
        length: usize,
        available: usize,
    },
    /// A caller-supplied value cannot be encoded into a frame field.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A response field does not decode as expected (non-hex digit or
    /// invalid UTF-8 in an ASCII field).
    #[error("malformed field: {0}")]
    MalformedField(String),
}
