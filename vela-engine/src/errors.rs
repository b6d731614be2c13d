use core::fmt;

use crate::bank::BankError;
use crate::earning::EarningError;
use crate::noding::NodingError;
use crate::tariff::TariffError;
use crate::types::*;

/// Represents an error when executing a block, a transaction or a scheduled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// An invariant violation or a state corruption. The whole block must be discarded.
    SystemError(SystemError),

    /// An expected, user-visible failure of a module operation.
    ApplicationError(ApplicationError),
}

impl RuntimeError {
    /// Whether the error aborts the block rather than just the transaction that raised it.
    pub fn is_abortion(&self) -> bool {
        matches!(self, RuntimeError::SystemError(_))
    }

    /// The stable identifier of an application error, e.g. `"NotQualified"`.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::SystemError(e) => e.into(),
            RuntimeError::ApplicationError(e) => e.kind(),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RuntimeError {}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<SystemError> for RuntimeError {
    fn from(error: SystemError) -> Self {
        RuntimeError::SystemError(error)
    }
}

impl From<ApplicationError> for RuntimeError {
    fn from(error: ApplicationError) -> Self {
        RuntimeError::ApplicationError(error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
pub enum SystemError {
    InvariantViolation(String),
    LotteryQueueError(LotteryQueueError),
    EncodeError(String),
    DecodeError(String),
    TimeOutOfRange(Instant),
    ArithmeticOverflow,
    EmptyHandlerName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotteryQueueError {
    AlreadyQueued(AccountAddress),
    NotQueued(AccountAddress),
}

impl From<LotteryQueueError> for RuntimeError {
    fn from(error: LotteryQueueError) -> Self {
        RuntimeError::SystemError(SystemError::LotteryQueueError(error))
    }
}

impl From<EncodeError> for RuntimeError {
    fn from(error: EncodeError) -> Self {
        RuntimeError::SystemError(SystemError::EncodeError(error.to_string()))
    }
}

impl From<DecodeError> for RuntimeError {
    fn from(error: DecodeError) -> Self {
        RuntimeError::SystemError(SystemError::DecodeError(error.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    NodingError(NodingError),
    EarningError(EarningError),
    BankError(BankError),
    TariffError(TariffError),

    /// The message signer lacks the permission required by the operation.
    Unauthorized(AccountAddress),
}

impl ApplicationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApplicationError::NodingError(e) => e.into(),
            ApplicationError::EarningError(e) => e.into(),
            ApplicationError::BankError(e) => e.into(),
            ApplicationError::TariffError(e) => e.into(),
            ApplicationError::Unauthorized(_) => "Unauthorized",
        }
    }
}

macro_rules! application_error_from {
    ($($error:ident),*) => {
        $(
            impl From<$error> for ApplicationError {
                fn from(error: $error) -> Self {
                    ApplicationError::$error(error)
                }
            }

            impl From<$error> for RuntimeError {
                fn from(error: $error) -> Self {
                    RuntimeError::ApplicationError(ApplicationError::$error(error))
                }
            }
        )*
    };
}

application_error_from!(NodingError, EarningError, BankError, TariffError);

/// Shorthand for an invariant violation with a formatted message.
pub(crate) fn invariant_violation(message: impl Into<String>) -> RuntimeError {
    RuntimeError::SystemError(SystemError::InvariantViolation(message.into()))
}
