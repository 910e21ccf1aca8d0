use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventSource, MessageEvent};

use crate::models::StreamEvent;
use crate::session::TransportState;

/// Handle over an open SSE connection.
///
/// `close` detaches the error listener before closing so the readyState
/// change caused by our own `close()` cannot re-enter the error path.
pub struct StreamHandle {
    source: EventSource,
    error_callback: Closure<dyn FnMut(Event)>,
}

impl StreamHandle {
    pub fn close(&self) {
        let _ = self.source.remove_event_listener_with_callback(
            "error",
            self.error_callback.as_ref().unchecked_ref(),
        );
        self.source.close();
    }
}

fn transport_state(source: &EventSource) -> TransportState {
    match source.ready_state() {
        EventSource::CONNECTING => TransportState::Connecting,
        EventSource::OPEN => TransportState::Open,
        _ => TransportState::Closed,
    }
}

/// Opens an EventSource on `url` and dispatches parsed [`StreamEvent`]s and
/// transport errors to the given callbacks, in arrival order.
pub fn start_streaming(
    url: &str,
    on_event: impl Fn(StreamEvent) + 'static,
    on_transport_error: impl Fn(TransportState) + 'static,
) -> Result<StreamHandle, String> {
    let source =
        EventSource::new(url).map_err(|e| format!("Failed to open event stream: {e:?}"))?;
    let on_event = Rc::new(on_event);

    // --- message / message_replace / message_end ---
    for name in ["message", "message_replace", "message_end"] {
        let handler = on_event.clone();
        let callback = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
            let Some(data) = ev
                .dyn_ref::<MessageEvent>()
                .and_then(|msg| msg.data().as_string())
            else {
                return;
            };
            if let Some(parsed) = StreamEvent::parse(name, &data) {
                handler(parsed);
            }
        });
        source
            .add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
            .map_err(|e| format!("Failed to attach {name} listener: {e:?}"))?;
        callback.forget();
    }

    // --- error ---
    // This listener sees both the relay's synthetic `event: error` frames
    // (MessageEvents carrying data) and plain transport errors; only the
    // latter are classified by readyState.
    let handler = on_event.clone();
    let source_for_error = source.clone();
    let error_callback = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
        let data = ev
            .dyn_ref::<MessageEvent>()
            .and_then(|msg| msg.data().as_string());
        match data {
            Some(data) => {
                if let Some(parsed) = StreamEvent::parse("error", &data) {
                    handler(parsed);
                }
            }
            None => on_transport_error(transport_state(&source_for_error)),
        }
    });
    source
        .add_event_listener_with_callback("error", error_callback.as_ref().unchecked_ref())
        .map_err(|e| format!("Failed to attach error listener: {e:?}"))?;

    Ok(StreamHandle { source, error_callback })
}
