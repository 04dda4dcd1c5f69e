use serde::Serialize;
use sim_core::{CityId, Good, ValidationError};
use sim_econ::EconError;
use thiserror::Error;

/// Which accumulator a visit limit applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Coarse class of an engine failure, for presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or disallowed intent.
    Validation,
    /// No water or food left to spend on the day.
    ResourceExhausted,
    /// The engine or its inputs are inconsistent.
    Internal,
}

/// Why an engine operation was refused. No state changes on any error.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("travel to {0} is still pending")]
    TravelPending(CityId),
    #[error("no travel is pending")]
    NoPendingTravel,
    #[error("unknown city: {0}")]
    UnknownCity(CityId),
    #[error("no road from {from} to {to}")]
    NoRoad { from: CityId, to: CityId },
    #[error("no water or food left to spend")]
    ResourceExhausted,
    #[error("city {0} has no market")]
    MissingMarket(CityId),
    #[error("requested {requested} {good}, a single trade allows at most {cap}")]
    TradeCapExceeded { good: Good, requested: u32, cap: u32 },
    #[error("offer worth {offered} does not cover request worth {requested}")]
    InsufficientValue { offered: u64, requested: u64 },
    #[error("insufficient {good}: have {have}, need {need}")]
    InsufficientGoods { good: Good, have: u32, need: u32 },
    #[error("{side:?} limit for {good} reached this visit: {used} used, {requested} requested, cap {cap}")]
    VisitLimitExceeded {
        good: Good,
        side: TradeSide,
        used: u32,
        requested: u32,
        cap: u32,
    },
    #[error("guards will not work for what you carry")]
    GuardsUnaffordable,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Econ(#[from] EconError),
}

impl EngineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::ResourceExhausted => ErrorClass::ResourceExhausted,
            EngineError::MissingMarket(_) | EngineError::Invalid(_) | EngineError::Econ(_) => {
                ErrorClass::Internal
            }
            _ => ErrorClass::Validation,
        }
    }
}
