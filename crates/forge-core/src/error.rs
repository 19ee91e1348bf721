//! Error types surfaced by the validation and assembly pipeline.

use alloc::string::String;

/// Errors raised while decoding consensus-serialized transaction bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The byte stream ended before the structure was fully read.
    UnexpectedEof,

    /// A compact-size length prefix does not fit in this platform's usize.
    Oversize(u64),

    /// Bytes were left over after the transaction was fully parsed.
    TrailingBytes(usize),

    /// The SegWit marker was present but the flag byte was not 0x01.
    BadWitnessFlag(u8),
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of transaction bytes"),
            Self::Oversize(n) => write!(f, "length prefix {} exceeds addressable size", n),
            Self::TrailingBytes(n) => write!(f, "{} trailing bytes after transaction", n),
            Self::BadWitnessFlag(b) => write!(f, "bad witness flag byte 0x{:02x}", b),
        }
    }
}

/// Errors raised by the script interpreter. Any of these evaluates the
/// input's script to FALSE and rejects the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptError {
    /// An opcode needed more operands than the stack held.
    StackUnderflow,

    /// A push opcode ran past the end of the script.
    TruncatedPush,

    /// An opcode outside the supported set was encountered.
    UnknownOpcode(u8),

    /// OP_EQUALVERIFY found a false comparison result.
    VerifyFailed,

    /// The final stack was empty or its top element was zero.
    EvaluatedFalse,

    /// A witness-program input carried a non-empty scriptSig.
    ScriptSigNotEmpty,

    /// The witness stack did not have the shape the program requires.
    MalformedWitness,

    /// The scriptPubKey did not match the declared program layout.
    MalformedProgram,
}

impl core::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StackUnderflow => write!(f, "stack underflow"),
            Self::TruncatedPush => write!(f, "push runs past end of script"),
            Self::UnknownOpcode(op) => write!(f, "unknown opcode 0x{:02x}", op),
            Self::VerifyFailed => write!(f, "equalverify failed"),
            Self::EvaluatedFalse => write!(f, "script evaluated to false"),
            Self::ScriptSigNotEmpty => write!(f, "scriptSig must be empty for witness input"),
            Self::MalformedWitness => write!(f, "malformed witness stack"),
            Self::MalformedProgram => write!(f, "malformed witness program"),
        }
    }
}

/// Per-transaction validation errors. Each rejects exactly one candidate;
/// the pipeline records a note and continues with the rest of the mempool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateError {
    /// The record violates a structural rule (version, counts, prevouts).
    Malformed(&'static str),

    /// The computed txid does not match the external identifier.
    IdMismatch,

    /// Output value exceeds input value.
    AmountUnderflow,

    /// An input's script evaluated to FALSE.
    Script(ScriptError),

    /// The prevout type has no execution path yet (p2sh, p2wsh, p2tr).
    UnsupportedType(String),
}

impl From<ScriptError> for ValidateError {
    fn from(e: ScriptError) -> Self {
        Self::Script(e)
    }
}

impl core::fmt::Display for ValidateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed(what) => write!(f, "malformed transaction: {}", what),
            Self::IdMismatch => write!(f, "txid does not match external identifier"),
            Self::AmountUnderflow => write!(f, "outputs exceed inputs"),
            Self::Script(e) => write!(f, "script failure: {}", e),
            Self::UnsupportedType(t) => write!(f, "unsupported script type: {}", t),
        }
    }
}

/// Block assembly errors. These abort the run; no block is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembleError {
    /// No validated transaction fit into the block.
    NoEligibleTransactions,
}

impl core::fmt::Display for AssembleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoEligibleTransactions => write!(f, "no eligible transactions to include"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}
#[cfg(feature = "std")]
impl std::error::Error for ScriptError {}
#[cfg(feature = "std")]
impl std::error::Error for ValidateError {}
#[cfg(feature = "std")]
impl std::error::Error for AssembleError {}
