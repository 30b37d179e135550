use thiserror::Error;

/// The error returned when looking up a key that is not in the map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("key not found")]
pub struct KeyError;
