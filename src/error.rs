use thiserror::Error;

/// Internal failure reasons used while resolving a conversion.
///
/// Never leaves the crate: `detector`/`convert` entry points stay total functions
/// returning `Option`, matching the error-handling design's "no fatal errors from
/// detection or conversion" rule. Kept as an enum (rather than inlined `None`s)
/// so call sites can `log::debug!` *why* a candidate was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("no recognizable conversion in input")]
    NoMatch,
    #[error("unknown unit: {0}")]
    UnknownUnit(String),
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("could not parse number or time from input")]
    ParseFailure,
    #[error("units belong to different dimensions")]
    DimensionMismatch,
}
