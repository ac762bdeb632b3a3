use std::path::PathBuf;

use thiserror::Error;

use crate::core::{
    ActiveTableError, ClassifyError, CoreError, Effect, InvalidId, InvalidTime, Transience,
    VtecParseError, ZoneHeaderError,
};

/// Crate-level convenience error.
///
/// A thin wrapper over the core error enums plus the host's own I/O,
/// configuration and script failures.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("invalid config: {reason}")]
    Config { reason: String },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("active table {} line {line}: {reason}", path.display())]
    TableCorrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid script: {reason}")]
    Script { reason: String },

    #[error("step {step}: {reason}")]
    Expectation { step: String, reason: String },
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Core(e) => e.transience(),
            Error::Io { .. } => Transience::Unknown,
            Error::Config { .. }
            | Error::TableCorrupt { .. }
            | Error::Script { .. }
            | Error::Expectation { .. } => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Error::Core(e) => e.effect(),
            Error::Io { .. } => Effect::Unknown,
            Error::Config { .. }
            | Error::TableCorrupt { .. }
            | Error::Script { .. }
            | Error::Expectation { .. } => Effect::None,
        }
    }

    /// Process exit status for this error, after sysexits(3).
    ///
    /// A failure that may have touched the table reports `EX_IOERR` (74)
    /// so callers can tell it from a clean rejection (1).
    pub fn exit_code(&self) -> i32 {
        if !self.effect().is_clean() {
            return 74;
        }
        if self.transience().is_retryable() {
            return 75;
        }
        1
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

macro_rules! via_core {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(err: $ty) -> Self {
                    Error::Core(CoreError::from(err))
                }
            }
        )+
    };
}

via_core!(
    ActiveTableError,
    ClassifyError,
    InvalidId,
    InvalidTime,
    VtecParseError,
    ZoneHeaderError,
);
