//! Command query parameter parsing.
//!
//! Both command routes take `deviceId` and `position` as query parameters.
//! Parameters are checked in that order and the first problem wins.

use std::collections::HashMap;

use thiserror::Error;

/// Query parameter carrying the device identifier.
pub const DEVICE_ID_PARAM: &str = "deviceId";
/// Query parameter carrying the target position.
pub const POSITION_PARAM: &str = "position";

/// A validated command.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandParams {
    /// Identifier of the target device within its class.
    pub device_id: String,
    /// Requested position, finite but not range checked.
    pub position: f64,
}

/// Why a command request was rejected before reaching a device.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    /// `deviceId` is absent or empty.
    #[error("No deviceId parameter present in request")]
    MissingDeviceId,
    /// `position` is absent or empty.
    #[error("No position parameter present in request")]
    MissingPosition,
    /// `position` is not a finite number; carries the raw text.
    #[error("Unparseable position value (got '{0}')")]
    InvalidPosition(String),
}

/// Extract and validate `deviceId` and `position`.
///
/// `NaN` and infinities are rejected. Out-of-range finite values pass through;
/// each driver maps them onto its own range.
pub fn parse_command_params(params: &HashMap<String, String>) -> Result<CommandParams, ParamError> {
    let device_id = present(params, DEVICE_ID_PARAM).ok_or(ParamError::MissingDeviceId)?;
    let raw = present(params, POSITION_PARAM).ok_or(ParamError::MissingPosition)?;

    Ok(CommandParams {
        device_id: device_id.to_string(),
        position: parse_position(raw)?,
    })
}

/// An empty value counts as absent.
fn present<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Parse a position value.
pub fn parse_position(raw: &str) -> Result<f64, ParamError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParamError::InvalidPosition(raw.to_string())),
    }
}
