//! Conversion of JavaScript exceptions into bridge errors.

use bridge_traits::error::BridgeError;
use wasm_bindgen::{JsCast, JsValue};

/// Map a thrown JavaScript value into a [`BridgeError`].
///
/// `QuotaExceededError` DOM exceptions become [`BridgeError::QuotaExceeded`];
/// `SecurityError` (storage disabled by the user agent) becomes
/// [`BridgeError::NotAvailable`].
pub(crate) fn js_error(context: &str, err: JsValue) -> BridgeError {
    if let Some(dom) = err.dyn_ref::<web_sys::DomException>() {
        let name = dom.name();
        return match name.as_str() {
            "QuotaExceededError" => BridgeError::QuotaExceeded(format!("{context}: {}", dom.message())),
            "SecurityError" => BridgeError::NotAvailable(format!("{context}: {}", dom.message())),
            _ => BridgeError::OperationFailed(format!("{context}: {name}: {}", dom.message())),
        };
    }

    let message = if err.is_string() {
        err.as_string().unwrap_or_default()
    } else if let Some(js_err) = err.dyn_ref::<js_sys::Error>() {
        js_err.message().into()
    } else {
        format!("{err:?}")
    };
    BridgeError::OperationFailed(format!("wasm {context}: {message}"))
}
