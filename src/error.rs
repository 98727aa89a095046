use thiserror::Error;

/// Per-symbol reasons a reading could not be produced this cycle.
///
/// Every variant is local to one symbol within a scan or monitor pass and
/// excludes only that symbol from the batch; nothing here aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("no usable bars returned")]
    NoData,

    #[error("could not resolve close/volume columns")]
    SchemaUnresolved,

    #[error("insufficient history: have {have} bars, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("trailing average volume is zero")]
    ZeroTrailingVolume,

    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),
}
