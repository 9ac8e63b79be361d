use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    /// Keyspace, column family or column does not exist
    NotFound,
    /// Caller supplied an argument the client refuses to send
    InvalidArgument,
    /// Server rejected the request (`InvalidRequestException`)
    InvalidRequest,
    /// Not enough replicas for the consistency level
    Unavailable,
    /// Replicas did not answer in time
    TimedOut,
    /// Socket could not be opened, read or written
    IOError,
    /// Bytes on the wire violate the Thrift protocol
    Corruption,
    /// Server-side `TApplicationException`
    Application,
}

#[derive(Debug, Clone)]
pub struct Status {
    code: Code,
    message: Option<String>,
}

impl Status {
    pub fn new(code: Code, message: Option<String>) -> Self {
        Status { code, message }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Status::new(Code::NotFound, Some(msg.into()))
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Status::new(Code::InvalidArgument, Some(msg.into()))
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Status::new(Code::InvalidRequest, Some(msg.into()))
    }

    pub fn unavailable() -> Self {
        Status::new(Code::Unavailable, None)
    }

    pub fn timed_out() -> Self {
        Status::new(Code::TimedOut, None)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Status::new(Code::IOError, Some(msg.into()))
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Status::new(Code::Corruption, Some(msg.into()))
    }

    pub fn application(msg: impl Into<String>) -> Self {
        Status::new(Code::Application, Some(msg.into()))
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Code::NotFound
    }

    pub fn is_invalid_request(&self) -> bool {
        self.code == Code::InvalidRequest
    }

    pub fn is_io_error(&self) -> bool {
        self.code == Code::IOError
    }

    pub fn is_corruption(&self) -> bool {
        self.code == Code::Corruption
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{:?}: {}", self.code, msg),
            None => write!(f, "{:?}", self.code),
        }
    }
}

impl std::error::Error for Status {}

impl From<std::io::Error> for Status {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                Status::io_error(format!("connection closed by peer: {err}"))
            }
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                Status::io_error(format!("socket timed out: {err}"))
            }
            _ => Status::io_error(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Status {
    fn from(err: serde_json::Error) -> Self {
        Status::invalid_argument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Status>;
