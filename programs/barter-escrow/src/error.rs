//! Error definitions

use std::fmt;

use solana_program::program_error::ProgramError;
use thiserror::Error;

use crate::{accounts::AccountRole, manifest::Side};

/// Identifies the piece of a payload or record an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Discriminant,
    NativeDirection,
    NativeAmount,
    LegCount(Side),
    LegAmount(Side, usize),
    InitializedFlag,
    RecordLength,
    Account(AccountRole),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Discriminant => write!(f, "instruction discriminant"),
            Field::NativeDirection => write!(f, "native direction"),
            Field::NativeAmount => write!(f, "native amount"),
            Field::LegCount(side) => write!(f, "{side} leg count"),
            Field::LegAmount(side, leg) => write!(f, "{side} leg {leg} amount"),
            Field::InitializedFlag => write!(f, "initialization flag"),
            Field::RecordLength => write!(f, "record length"),
            Field::Account(role) => write!(f, "{role}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscrowError {
    // Layout errors
    #[error("Malformed key for {field}: expected 32 bytes, got {len}")]
    MalformedKey { field: Field, len: usize },

    #[error("Unknown instruction discriminant {0}")]
    UnknownInstruction(u8),

    #[error("Invalid {field}: {value} is not a direction")]
    InvalidDirection { field: Field, value: u8 },

    #[error("Instruction truncated at {field}: needs {needed} bytes, {available} available")]
    TruncatedInstruction {
        field: Field,
        needed: usize,
        available: usize,
    },

    #[error("{count} trailing bytes after instruction payload")]
    TrailingBytes { count: usize },

    #[error("Amount overflow in {field}")]
    AmountOverflow { field: Field },

    // Leg manifest errors
    #[error("{side} side declares {count} legs, at most {max} allowed")]
    TooManyLegs { side: Side, count: usize, max: usize },

    #[error("{side} leg count {declared} does not match {actual} non-zero legs")]
    LegCountMismatch {
        side: Side,
        declared: usize,
        actual: usize,
    },

    // Record errors
    #[error("Invalid {field}: {value}")]
    InvalidFlag { field: Field, value: u8 },

    #[error("Malformed escrow record at {field}: {reason}")]
    MalformedRecord { field: Field, reason: &'static str },

    #[error("Escrow is not active")]
    EscrowNotActive,

    #[error("Escrow is already active")]
    EscrowAlreadyActive,

    // Account list errors
    #[error("Account list holds {provided} accounts, instruction requires {expected}")]
    AccountCountMismatch { expected: usize, provided: usize },
}

impl EscrowError {
    /// Stable code surfaced as `ProgramError::Custom`
    pub fn code(&self) -> u32 {
        match self {
            EscrowError::MalformedKey { .. } => 0,
            EscrowError::UnknownInstruction(_) => 1,
            EscrowError::InvalidDirection { .. } => 2,
            EscrowError::TruncatedInstruction { .. } => 3,
            EscrowError::TrailingBytes { .. } => 4,
            EscrowError::AmountOverflow { .. } => 5,
            EscrowError::TooManyLegs { .. } => 6,
            EscrowError::LegCountMismatch { .. } => 7,
            EscrowError::InvalidFlag { .. } => 8,
            EscrowError::MalformedRecord { .. } => 9,
            EscrowError::EscrowNotActive => 10,
            EscrowError::EscrowAlreadyActive => 11,
            EscrowError::AccountCountMismatch { .. } => 12,
        }
    }
}

impl From<EscrowError> for ProgramError {
    fn from(err: EscrowError) -> Self {
        ProgramError::Custom(err.code())
    }
}

pub type EscrowResult<T> = Result<T, EscrowError>;
