//! definition of the general client error type

use core::fmt;
use std::sync::Arc;

use crate::data::ValueKind;
use crate::frame::SqiReply;

/**
    general object reporting an unexpected result of a conversation with the device

    Its variants are meant to help finding the cause responsible for the problem and how to deal
    with it. Nothing is retried inside the library: every failure is surfaced through this type
    and the caller decides its own retry pace.

    After [Self::Timeout] or [Self::Io] during an exchange, the byte stream may hold a half
    written request or an unread response. There is no resynchronization protocol: the session
    must be closed and reopened before further use.
*/
#[derive(Clone, Debug)]
pub enum EthernetError {
    /// error caused by the communication support
    ///
    /// these errors are exterior to this library
    Io(Arc<std::io::Error>),

    /// the per-call deadline elapsed before the socket operation completed
    ///
    /// the session is left broken, reconnect before retrying
    Timeout(&'static str),

    /// fewer bytes than a frame header were received
    ShortHeader { available: usize },

    /// the header announced more payload bytes than were received
    Truncated { announced: usize, available: usize },

    /// the device broke the conversation rules, e.g. an error segment in the middle of a transfer
    Protocol(&'static str),

    /// the device reported a failure on its internal SQI channel
    ///
    /// [SqiReply::Busy] is transient and the operation can be retried by the caller
    Device(SqiReply),

    /// the object dictionary data type has no codec rule
    UnsupportedType(u16),

    /// a typed accessor was used with a type not matching the declared data type
    TypeMismatch { expected: ValueKind, got: ValueKind },

    /// the raw buffer is smaller than the declared data type width
    SizeMismatch { expected: usize, actual: usize },

    /// the parameter is not present in the local object dictionary
    NotFound { index: u16, subindex: u8 },

    /// the session was misused by the caller, e.g. exchanging while disconnected
    Client(&'static str),
}

/// convenient alias to simplify return annotations
pub type EthernetResult<T> = Result<T, EthernetError>;

impl fmt::Display for EthernetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io: {}", error),
            Self::Timeout(message) => write!(f, "timeout: {}", message),
            Self::ShortHeader { available } =>
                write!(f, "short header: {} bytes received", available),
            Self::Truncated { announced, available } =>
                write!(f, "truncated frame: header announced {} payload bytes, {} received", announced, available),
            Self::Protocol(message) => write!(f, "protocol: {}", message),
            Self::Device(reply) => match reply {
                SqiReply::Busy => write!(f, "device busy"),
                SqiReply::Err => write!(f, "device error"),
                SqiReply::Ack => write!(f, "device acknowledged"),
            },
            Self::UnsupportedType(code) =>
                write!(f, "data type {:#06x} is not supported by the codec", code),
            Self::TypeMismatch { expected, got } =>
                write!(f, "type mismatch: expected {:?}, got {:?}", expected, got),
            Self::SizeMismatch { expected, actual } =>
                write!(f, "size mismatch: {} bytes needed, {} present", expected, actual),
            Self::NotFound { index, subindex } =>
                write!(f, "parameter {:#06x}:{:02x} is not in the dictionary", index, subindex),
            Self::Client(message) => write!(f, "client: {}", message),
        }
    }
}

impl std::error::Error for EthernetError {}

impl From<std::io::Error> for EthernetError {
    fn from(src: std::io::Error) -> Self {
        EthernetError::Io(Arc::new(src))
    }
}

impl From<packed_struct::PackingError> for EthernetError {
    fn from(_: packed_struct::PackingError) -> Self {
        EthernetError::Protocol("malformed frame header")
    }
}
