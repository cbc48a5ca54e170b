//! Error type shared by all evaluation entry points.
use crate::evaluate::DofLocation;
use crate::quadrature::QuadratureType;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Configuration errors raised by the evaluators.
///
/// Every variant raised by an entry point carries the name of that entry point, so that a
/// setup mistake can be traced back to the offending call.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EvalError {
    /// The requested quadrature precision cannot be used for integration.
    InvalidQuadratureType {
        caller: &'static str,
        qtype: QuadratureType,
    },
    /// The combination of DoF location and dimension is not implemented.
    NotHandled {
        caller: &'static str,
        location: DofLocation,
        dim: usize,
    },
    /// The support, location or stride of the input is not implemented.
    InvalidSupport { caller: &'static str, reason: String },
    /// The output buffer cannot hold every addressed entry.
    OutputTooSmall {
        caller: &'static str,
        required: usize,
        actual: usize,
    },
    /// The definition refers to a zone missing from the registry.
    UnknownZone { zone_id: usize },
    /// A definition was constructed from inconsistent data.
    InvalidDefinition { reason: String },
}

impl Display for EvalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuadratureType { caller, qtype } => {
                write!(f, "{caller}: invalid quadrature type \"{qtype}\"")
            }
            Self::NotHandled { caller, location, dim } => write!(
                f,
                "{caller}: case not handled (location {location:?}, dimension {dim})"
            ),
            Self::InvalidSupport { caller, reason } => write!(f, "{caller}: invalid support: {reason}"),
            Self::OutputTooSmall {
                caller,
                required,
                actual,
            } => write!(
                f,
                "{caller}: output buffer holds {actual} values but {required} are required"
            ),
            Self::UnknownZone { zone_id } => write!(f, "No zone with id {zone_id} is registered"),
            Self::InvalidDefinition { reason } => write!(f, "Invalid definition: {reason}"),
        }
    }
}

impl std::error::Error for EvalError {}

pub(crate) fn check_output_len(caller: &'static str, out: &[f64], required: usize) -> Result<(), EvalError> {
    if out.len() < required {
        Err(EvalError::OutputTooSmall {
            caller,
            required,
            actual: out.len(),
        })
    } else {
        Ok(())
    }
}

pub(crate) fn invalid_support(caller: &'static str, reason: impl Into<String>) -> EvalError {
    EvalError::InvalidSupport {
        caller,
        reason: reason.into(),
    }
}
