use serde::Serialize;

use crate::error::PgxError;

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, PgxError> {
    Ok(serde_json::to_string_pretty(value)?)
}
