//! Conversion between `serde_json::Value` and script values.
//!
//! Values cross the boundary as JSON text, parsed and stringified by the
//! engine itself.

use rquickjs::{Ctx, Value};

use crate::error::{Error, Result};

/// Converts a JSON value into a script value.
///
/// # Errors
///
/// Returns [`Error::Conversion`] if the engine rejects the JSON text.
pub fn json_to_js<'js>(ctx: &Ctx<'js>, value: &serde_json::Value) -> Result<Value<'js>> {
    let text = serde_json::to_string(value).map_err(|e| Error::Conversion {
        message: e.to_string(),
    })?;

    ctx.json_parse(text).map_err(|e| Error::Conversion {
        message: format!("JSON.parse failed: {e}"),
    })
}

/// Converts a script value into JSON.
///
/// `undefined`, functions and symbols become `null`. Objects keep only
/// what `JSON.stringify` keeps.
///
/// # Errors
///
/// Returns [`Error::Conversion`] for values `JSON.stringify` throws on,
/// such as `BigInt`s or cyclic objects.
pub fn js_to_json<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Result<serde_json::Value> {
    if value.is_undefined() || value.is_null() || value.is_function() {
        return Ok(serde_json::Value::Null);
    }

    match ctx.json_stringify(value) {
        Ok(Some(text)) => {
            let text: String = text.to_string().map_err(|e| Error::Conversion {
                message: format!("string conversion failed: {e}"),
            })?;
            serde_json::from_str(&text).map_err(|e| Error::Conversion {
                message: e.to_string(),
            })
        }
        Ok(None) => Ok(serde_json::Value::Null),
        Err(e) => Err(Error::Conversion {
            message: format!("JSON.stringify failed: {e}"),
        }),
    }
}
