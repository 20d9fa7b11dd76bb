//! Error types for the OakDB client SDK core.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
  /// A DSL node was constructed from invalid input (empty identifier,
  /// zero max attempts, wrong argument shape known at construction).
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  /// A builder invariant only detectable at render time was violated.
  #[error("Render error: {0}")]
  Render(String),

  /// A chunk payload could not be decoded to the expected structure.
  /// Scoped to one chunk; sibling sections are unaffected.
  #[error("Transcoding error: {0}")]
  Transcoding(String),

  /// Underlying connection or protocol failure. Aborts every open
  /// section of the current decode.
  #[error("Transport error: {0}")]
  Transport(String),

  #[error("Server error: {0}")]
  Server(String),

  #[error("Timeout")]
  Timeout,

  #[error("Cancelled")]
  Cancelled,

  #[error("Channel closed")]
  ChannelClosed,
}

/// Flat classification of [`Error`], used by retry-policy filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  InvalidArgument,
  Render,
  Transcoding,
  Transport,
  Server,
  Timeout,
  Cancelled,
  ChannelClosed,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
      Self::Render(_) => ErrorKind::Render,
      Self::Transcoding(_) => ErrorKind::Transcoding,
      Self::Transport(_) => ErrorKind::Transport,
      Self::Server(_) => ErrorKind::Server,
      Self::Timeout => ErrorKind::Timeout,
      Self::Cancelled => ErrorKind::Cancelled,
      Self::ChannelClosed => ErrorKind::ChannelClosed,
    }
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Self::Transcoding(e.to_string())
  }
}

impl From<rmp_serde::decode::Error> for Error {
  fn from(e: rmp_serde::decode::Error) -> Self {
    Self::Transcoding(e.to_string())
  }
}

pub type Result<T> = std::result::Result<T, Error>;
