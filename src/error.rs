use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PlanningError {
    PlanNotFound(String),
    TeamNotFound(String),
    PhaseNotFound(String),
    TaskNotFound(String),
    UnknownEffortType(String),
    BuiltinEffortType(String),
    DuplicateEffortType(String),
    InvalidData(String),
    Json(SerdeJsonError),
    Io(io::Error),
}

impl fmt::Display for PlanningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningError::PlanNotFound(id) => write!(f, "plan '{id}' not found"),
            PlanningError::TeamNotFound(id) => write!(f, "team '{id}' not found"),
            PlanningError::PhaseNotFound(id) => write!(f, "phase '{id}' not found"),
            PlanningError::TaskNotFound(id) => write!(f, "task '{id}' not found"),
            PlanningError::UnknownEffortType(key) => write!(f, "unknown effort type '{key}'"),
            PlanningError::BuiltinEffortType(key) => {
                write!(f, "effort type '{key}' is built in and cannot be removed")
            }
            PlanningError::DuplicateEffortType(key) => {
                write!(f, "effort type '{key}' already exists")
            }
            PlanningError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            PlanningError::Json(err) => write!(f, "json error: {err}"),
            PlanningError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for PlanningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanningError::Json(err) => Some(err),
            PlanningError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SerdeJsonError> for PlanningError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Json(value)
    }
}

impl From<io::Error> for PlanningError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

pub type PlanningResult<T> = Result<T, PlanningError>;
