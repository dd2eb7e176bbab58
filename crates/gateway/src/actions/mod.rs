//! Handler registration for the three services.

use std::sync::Arc;

use hive_bus::ControlBus;
use hive_types::error::{ApiError, Code};

use crate::AppState;

pub mod account;
pub mod ec2;
pub mod iam;

/// The connected bus, for handlers past the dispatcher's bus gate.
pub(crate) fn bus(state: &AppState) -> Result<&Arc<dyn ControlBus>, ApiError> {
    state.bus.as_ref().ok_or_else(|| {
        ApiError::with_message(Code::ServerInternal, "control bus is not connected")
    })
}

/// Unwraps a mandatory parameter.
pub(crate) fn required<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| {
        ApiError::with_message(Code::MissingParameter, format!("{name} is required"))
    })
}
