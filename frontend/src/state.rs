use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;

use crate::api;
use crate::session::{ChatEngine, Control, ErrorDisposition};
use crate::sse::{self, StreamHandle};

/// Shared application state, provided via Leptos context.
///
/// All session logic lives in [`ChatEngine`]; this layer only routes
/// transport callbacks into the engine through one signal (single writer)
/// and closes the connection when the engine says so.
#[derive(Clone, Copy)]
pub struct AppState {
    pub engine: RwSignal<ChatEngine>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let state = Self { engine: RwSignal::new(ChatEngine::new()) };
        provide_context(state);
        state
    }

    /// Send a message by opening one SSE stream session against the relay.
    pub fn send_message(&self, text: String) {
        let engine = self.engine;

        let accepted = engine.try_update(|e| e.begin_query(&text)).unwrap_or(false);
        if !accepted {
            return;
        }

        let conversation_id =
            engine.with_untracked(|e| e.conversation_id().map(str::to_owned));
        let url = api::stream_url(text.trim(), conversation_id.as_deref());

        // The handle is created after the callbacks that need to close it,
        // so it travels behind a shared cell.
        let handle: Rc<RefCell<Option<StreamHandle>>> = Rc::new(RefCell::new(None));

        let handle_for_events = handle.clone();
        let on_event = move |event| {
            let control = engine
                .try_update(|e| e.apply_event(event))
                .unwrap_or(Control::Continue);
            if control == Control::Close {
                if let Some(h) = handle_for_events.borrow_mut().take() {
                    h.close();
                }
            }
        };

        let handle_for_errors = handle.clone();
        let on_transport_error = move |transport| {
            let disposition = engine
                .try_update(|e| e.on_transport_error(transport))
                .unwrap_or(ErrorDisposition::Ignore);
            match disposition {
                ErrorDisposition::Ignore => {}
                ErrorDisposition::CompleteQuietly => {
                    if let Some(h) = handle_for_errors.borrow_mut().take() {
                        h.close();
                    }
                }
                ErrorDisposition::Abort => {
                    log::error!("SSE stream failed (transport state: {transport:?})");
                    if let Some(h) = handle_for_errors.borrow_mut().take() {
                        h.close();
                    }
                }
            }
        };

        match sse::start_streaming(&url, on_event, on_transport_error) {
            Ok(h) => {
                *handle.borrow_mut() = Some(h);
            }
            Err(err) => {
                log::error!("{err}");
                engine.update(|e| e.abort());
            }
        }
    }
}
