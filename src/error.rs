use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// An interval string did not name one of the five recognized intervals.
    InvalidInterval(String),
    /// The named partition does not exist in the backing store.
    PartitionNotFound(String),
    /// The named partition is mid-provisioning and cannot accept writes yet.
    PartitionBusy(String),
    /// The readiness poll budget was exhausted before the partition became usable.
    PartitionNotReady(String),
    /// A wire value could not be decoded back into its in-memory form.
    Codec(String),
    /// A backend fault that is not retried by this layer.
    Backend(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInterval(msg) => write!(f, "invalid interval: {msg}"),
            Error::PartitionNotFound(name) => write!(f, "partition not found: {name}"),
            Error::PartitionBusy(name) => write!(f, "partition busy: {name}"),
            Error::PartitionNotReady(name) => write!(f, "partition not ready: {name}"),
            Error::Codec(msg) => write!(f, "codec error: {msg}"),
            Error::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
