//! Two-variant result shape used in API payloads.

use serde::{Deserialize, Serialize};

/// Serializable result: `{"type": "Ok", "value": ...}` or `{"type": "Err", "err": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsonResult<T, E> {
    Ok { value: T },
    Err { err: E },
}

impl<T, E> JsonResult<T, E> {
    pub fn ok(value: T) -> Self {
        JsonResult::Ok { value }
    }

    pub fn err(err: E) -> Self {
        JsonResult::Err { err }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, JsonResult::Ok { .. })
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }
}

impl<T, E> From<Result<T, E>> for JsonResult<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => JsonResult::Ok { value },
            Err(err) => JsonResult::Err { err },
        }
    }
}
