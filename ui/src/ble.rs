//! Web Bluetooth glue for the BLE IMU peripheral.
//!
//! `web-sys` only exposes Bluetooth behind unstable cfgs, so the GATT calls go
//! through `js_sys::Reflect` on the raw objects.

use crate::state::DashCtx;
use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use leptos::*;
use std::cell::RefCell;
use telemetry_feed::ble::{BleLink, ImuCharacteristic, DEVICE_NAME_PREFIX, SERVICE_UUID};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

thread_local! {
    static DEVICE: RefCell<Option<JsValue>> = const { RefCell::new(None) };
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
}

fn call(target: &JsValue, method: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
    let f: Function = get(target, method)?
        .dyn_into()
        .map_err(|_| JsValue::from_str(&format!("{method} is not a function")))?;
    let array = Array::new();
    for a in args {
        array.push(a);
    }
    f.apply(target, &array)
}

async fn call_async(target: &JsValue, method: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
    let promise: Promise = call(target, method, args)?
        .dyn_into()
        .map_err(|_| JsValue::from_str(&format!("{method} did not return a promise")))?;
    JsFuture::from(promise).await
}

fn error_detail(e: &JsValue) -> String {
    get(e, "message")
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| e.as_string())
        .unwrap_or_else(|| "unknown error".to_string())
}

fn request_options() -> Result<JsValue, JsValue> {
    let filter = Object::new();
    Reflect::set(&filter, &"namePrefix".into(), &DEVICE_NAME_PREFIX.into())?;
    let options = Object::new();
    Reflect::set(&options, &"filters".into(), &Array::of1(&filter))?;
    Reflect::set(
        &options,
        &"optionalServices".into(),
        &Array::of1(&SERVICE_UUID.into()),
    )?;
    Ok(options.into())
}

/// Bytes of `event.target.value` (a `DataView`).
fn payload(event: &JsValue) -> Result<Vec<u8>, JsValue> {
    let view: js_sys::DataView = get(&get(event, "target")?, "value")?
        .dyn_into()
        .map_err(|_| JsValue::from_str("value is not a DataView"))?;
    let bytes = Uint8Array::new_with_byte_offset_and_length(
        &view.buffer(),
        view.byte_offset() as u32,
        view.byte_length() as u32,
    );
    Ok(bytes.to_vec())
}

async fn connect(ctx: &DashCtx) -> Result<(), JsValue> {
    let navigator = web_sys::window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .navigator();
    let bluetooth = get(&navigator, "bluetooth")?;
    if bluetooth.is_undefined() || bluetooth.is_null() {
        return Err(JsValue::from_str(
            "Web Bluetooth API is not supported in this browser",
        ));
    }

    let device = call_async(&bluetooth, "requestDevice", &[&request_options()?]).await?;
    ctx.ble_link.set(BleLink::Connecting);

    let gatt = get(&device, "gatt")?;
    let server = call_async(&gatt, "connect", &[]).await?;
    let service = call_async(&server, "getPrimaryService", &[&SERVICE_UUID.into()]).await?;

    for characteristic in ImuCharacteristic::ALL {
        let handle =
            call_async(&service, "getCharacteristic", &[&characteristic.uuid().into()]).await?;
        call_async(&handle, "startNotifications", &[]).await?;

        let readings = ctx.ble;
        let on_value = Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |event: JsValue| {
            let applied = payload(&event).map(|bytes| {
                readings.try_update(|r| r.apply(characteristic, &bytes))
            });
            match applied {
                Ok(Some(Err(e))) => log::warn!("ble {characteristic:?}: {e}"),
                Err(e) => log::warn!("ble {characteristic:?}: {}", error_detail(&e)),
                _ => {}
            }
        }));
        call(
            &handle,
            "addEventListener",
            &[&"characteristicvaluechanged".into(), on_value.as_ref()],
        )?;
        on_value.forget();
    }

    let link = ctx.ble_link;
    let on_disconnect = Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
        log::info!("ble device disconnected");
        link.try_set(BleLink::Disconnected);
    }));
    call(
        &device,
        "addEventListener",
        &[&"gattserverdisconnected".into(), on_disconnect.as_ref()],
    )?;
    on_disconnect.forget();

    DEVICE.with(|d| *d.borrow_mut() = Some(device));
    Ok(())
}

/// Ask the user for a device and subscribe to all six IMU characteristics.
pub fn start_connect(ctx: &DashCtx) {
    if !ctx.ble_link.get_untracked().can_connect() {
        return;
    }
    ctx.ble_link.set(BleLink::Scanning);
    let ctx = ctx.clone();
    spawn_local(async move {
        match connect(&ctx).await {
            Ok(()) => {
                log::info!("ble connected");
                ctx.ble_link.set(BleLink::Connected);
            }
            Err(e) => {
                let detail = error_detail(&e);
                log::error!("ble connection failed: {detail}");
                ctx.ble_link.set(BleLink::Failed(detail));
            }
        }
    });
}

/// Best effort; used on page unload.
pub fn disconnect() {
    let device = DEVICE.with(|d| d.borrow_mut().take());
    if let Some(device) = device {
        let result = get(&device, "gatt").and_then(|gatt| call(&gatt, "disconnect", &[]));
        if let Err(e) = result {
            log::warn!("ble disconnect: {}", error_detail(&e));
        }
    }
}
