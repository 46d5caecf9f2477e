//! Browser storage backend: one IndexedDB object store (`noema_kv`) per
//! database instance, keyed by the same namespaced strings as every other
//! backend. IndexedDB rather than the raw Origin Private File System API
//! because it gives us key-range scans (`list`) for free and is available
//! in every browser `web-sys` targets; a future OPFS-file variant would
//! slot in behind the same [`StorageBackend`] contract.

use super::{ListEntry, StorageBackend, StorageError, StorageErrorKind, UsageEstimate};
use async_trait::async_trait;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{IdbDatabase, IdbKeyRange, IdbTransactionMode};

const STORE_NAME: &str = "noema_kv";
const DB_VERSION: u32 = 1;

/// IndexedDB-backed storage. `Send + Sync` is satisfied trivially: wasm32
/// is single-threaded, and `web-sys` handles aren't actually shared across
/// a thread boundary that exists.
pub struct OpfsBackend {
    db: IdbDatabase,
}

// Safety: wasm32 has no threads; these handles never cross a real boundary.
unsafe impl Send for OpfsBackend {}
unsafe impl Sync for OpfsBackend {}

impl OpfsBackend {
    /// Opens (creating if needed) the IndexedDB database `name`, with a
    /// single object store for all namespaces.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if IndexedDB is unavailable or the open
    /// request is rejected.
    pub async fn open(name: &str) -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or_else(|| js_error("no window in this context"))?;
        let factory = window
            .indexed_db()
            .map_err(|e| js_error(&format!("{e:?}")))?
            .ok_or_else(|| js_error("indexedDB unsupported"))?;

        let open_request = factory
            .open_with_u32(name, DB_VERSION)
            .map_err(|e| js_error(&format!("{e:?}")))?;

        let upgrade_request = open_request.clone();
        let onupgradeneeded = Closure::once(move |_event: web_sys::Event| {
            if let Ok(result) = upgrade_request.result() {
                let db: IdbDatabase = result.unchecked_into();
                if !db.object_store_names().contains(STORE_NAME) {
                    let _ = db.create_object_store(STORE_NAME);
                }
            }
        });
        open_request.set_onupgradeneeded(Some(onupgradeneeded.as_ref().unchecked_ref()));
        onupgradeneeded.forget();

        let db = await_request(&open_request).await?;
        Ok(Self { db: db.unchecked_into() })
    }

    fn store(&self, mode: IdbTransactionMode) -> Result<web_sys::IdbObjectStore, StorageError> {
        let txn = self
            .db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .map_err(|e| js_error(&format!("{e:?}")))?;
        txn.object_store(STORE_NAME).map_err(|e| js_error(&format!("{e:?}")))
    }
}

#[async_trait]
impl StorageBackend for OpfsBackend {
    async fn put(&self, key: &str, blob: Vec<u8>) -> Result<(), StorageError> {
        let store = self.store(IdbTransactionMode::Readwrite)?;
        let array = js_sys::Uint8Array::from(blob.as_slice());
        let request = store
            .put_with_key(&array, &JsValue::from_str(key))
            .map_err(|e| js_error(&format!("{e:?}")))?;
        await_request(&request).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let store = self.store(IdbTransactionMode::Readonly)?;
        let request = store
            .get(&JsValue::from_str(key))
            .map_err(|e| js_error(&format!("{e:?}")))?;
        let value = await_request(&request).await?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        let array: js_sys::Uint8Array = value.unchecked_into();
        Ok(Some(array.to_vec()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let store = self.store(IdbTransactionMode::Readwrite)?;
        let request = store
            .delete(&JsValue::from_str(key))
            .map_err(|e| js_error(&format!("{e:?}")))?;
        await_request(&request).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ListEntry>, StorageError> {
        let store = self.store(IdbTransactionMode::Readonly)?;
        let range = IdbKeyRange::bound(
            &JsValue::from_str(prefix),
            &JsValue::from_str(&format!("{prefix}\u{ffff}")),
        )
        .map_err(|e| js_error(&format!("{e:?}")))?;
        let request = store
            .get_all_keys_with_key(&range)
            .map_err(|e| js_error(&format!("{e:?}")))?;
        let keys = await_request(&request).await?;
        let keys: js_sys::Array = keys.unchecked_into();

        let mut out = Vec::with_capacity(keys.length() as usize);
        for key in keys.iter() {
            let Some(key) = key.as_string() else { continue };
            let get_request = store.get(&JsValue::from_str(&key)).map_err(|e| js_error(&format!("{e:?}")))?;
            let value = await_request(&get_request).await?;
            let size = if value.is_undefined() || value.is_null() {
                0
            } else {
                let array: js_sys::Uint8Array = value.unchecked_into();
                array.length() as u64
            };
            out.push(ListEntry { id: key[prefix.len()..].to_string(), size });
        }
        Ok(out)
    }

    async fn estimate_usage(&self) -> Result<UsageEstimate, StorageError> {
        let window = web_sys::window().ok_or_else(|| js_error("no window in this context"))?;
        let navigator = window.navigator();
        let estimate = navigator.storage().estimate().map_err(|e| js_error(&format!("{e:?}")))?;
        let estimate = JsFuture::from(estimate)
            .await
            .map_err(|e| js_error(&format!("{e:?}")))?;
        let usage = js_sys::Reflect::get(&estimate, &"usage".into())
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as u64;
        let quota = js_sys::Reflect::get(&estimate, &"quota".into())
            .ok()
            .and_then(|v| v.as_f64())
            .map(|v| v as u64);
        Ok(UsageEstimate { used_bytes: usage, quota_bytes: quota, details: "indexeddb".to_string() })
    }
}

fn js_error(message: &str) -> StorageError {
    StorageError::new(StorageErrorKind::BackendSpecific, message.to_string())
}

/// Awaits an `IDBRequest`, resolving with its `.result()` on success and
/// mapping `onerror` to a [`StorageError`].
async fn await_request(request: &web_sys::IdbRequest) -> Result<JsValue, StorageError> {
    let (tx, rx) = futures_channel_oneshot();

    let tx_ok = tx.clone();
    let onsuccess = Closure::once(move |_event: web_sys::Event| {
        let _ = tx_ok.send(Ok(()));
    });
    let tx_err = tx;
    let onerror = Closure::once(move |_event: web_sys::Event| {
        let _ = tx_err.send(Err(js_error("indexeddb request failed")));
    });

    request.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
    request.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onsuccess.forget();
    onerror.forget();

    rx.await.map_err(|_| js_error("indexeddb request dropped"))??;
    request.result().map_err(|e| js_error(&format!("{e:?}")))
}

/// A minimal single-shot channel so `await_request` can bridge IndexedDB's
/// callback-based API into `async`/`await` without pulling in `futures`'s
/// full oneshot (wasm32 is single-threaded; a `RefCell`-backed slot suffices).
/// The sender wakes the stored waker on send rather than the receiver
/// re-waking itself, so the executor actually yields between the request
/// firing and its `onsuccess`/`onerror` callback landing.
fn futures_channel_oneshot() -> (OneshotSender, OneshotReceiver) {
    use std::cell::RefCell;
    use std::rc::Rc;
    let slot = Rc::new(RefCell::new(OneshotState { value: None, waker: None }));
    (OneshotSender { slot: slot.clone() }, OneshotReceiver { slot })
}

struct OneshotState {
    value: Option<Result<(), StorageError>>,
    waker: Option<std::task::Waker>,
}

#[derive(Clone)]
struct OneshotSender {
    slot: std::rc::Rc<std::cell::RefCell<OneshotState>>,
}

impl OneshotSender {
    fn send(&self, value: Result<(), StorageError>) -> Result<(), ()> {
        let mut state = self.slot.borrow_mut();
        state.value = Some(value);
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
        Ok(())
    }
}

struct OneshotReceiver {
    slot: std::rc::Rc<std::cell::RefCell<OneshotState>>,
}

impl std::future::Future for OneshotReceiver {
    type Output = Result<Result<(), StorageError>, ()>;

    fn poll(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        let mut state = self.slot.borrow_mut();
        match state.value.take() {
            Some(v) => std::task::Poll::Ready(Ok(v)),
            None => {
                state.waker = Some(cx.waker().clone());
                std::task::Poll::Pending
            }
        }
    }
}
