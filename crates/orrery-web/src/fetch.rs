use js_sys::{Reflect, Uint8Array};
use orrery_engine::SceneError;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortSignal, ReadableStreamDefaultReader, RequestInit, Response};

fn fetch_err(path: &str, e: JsValue) -> SceneError {
    SceneError::Fetch {
        path: path.to_string(),
        reason: format!("{:?}", e),
    }
}

/// Fetch `path` as bytes, reporting `(loaded, total)` as chunks arrive.
/// `total` is the Content-Length when the server sends one. Aborting
/// `signal` rejects the request or the pending chunk read.
pub async fn fetch_bytes(
    path: &str,
    signal: Option<&AbortSignal>,
    mut on_progress: impl FnMut(u64, Option<u64>),
) -> Result<Vec<u8>, SceneError> {
    let win = web_sys::window().ok_or_else(|| fetch_err(path, JsValue::from_str("no window")))?;
    let init = RequestInit::new();
    init.set_signal(signal);
    let resp_val = JsFuture::from(win.fetch_with_str_and_init(path, &init))
        .await
        .map_err(|e| fetch_err(path, e))?;
    let resp: Response = resp_val.dyn_into().map_err(|e| fetch_err(path, e))?;

    if !resp.ok() {
        return Err(SceneError::Fetch {
            path: path.to_string(),
            reason: format!("HTTP {} {}", resp.status(), resp.status_text()),
        });
    }

    let total = resp
        .headers()
        .get("content-length")
        .ok()
        .flatten()
        .and_then(|v| v.parse::<u64>().ok());

    let Some(body) = resp.body() else {
        // No stream exposed: read it whole.
        let buf_promise = resp.array_buffer().map_err(|e| fetch_err(path, e))?;
        let buf_val = JsFuture::from(buf_promise).await.map_err(|e| fetch_err(path, e))?;
        let out = Uint8Array::new(&buf_val).to_vec();
        on_progress(out.len() as u64, total);
        return Ok(out);
    };

    let reader: ReadableStreamDefaultReader = body
        .get_reader()
        .dyn_into()
        .map_err(|e| fetch_err(path, e.into()))?;
    let mut out = Vec::with_capacity(total.unwrap_or(0) as usize);
    loop {
        let chunk = JsFuture::from(reader.read()).await.map_err(|e| fetch_err(path, e))?;
        let done = Reflect::get(&chunk, &JsValue::from_str("done"))
            .map_err(|e| fetch_err(path, e))?
            .as_bool()
            .unwrap_or(true);
        if done {
            break;
        }
        let value = Reflect::get(&chunk, &JsValue::from_str("value")).map_err(|e| fetch_err(path, e))?;
        out.extend_from_slice(&Uint8Array::new(&value).to_vec());
        on_progress(out.len() as u64, total);
    }
    Ok(out)
}
