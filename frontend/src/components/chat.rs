use leptos::ev;
use leptos::prelude::*;

use crate::state::AppState;

/// Main chat area with message history and input. Pure presentation: every
/// decision lives in the session engine.
#[component]
pub fn ChatArea() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <main class="chat-area">
            // Messages
            <div class="messages-container">
                {move || {
                    state.engine.with(|engine| {
                        if engine.messages().is_empty() {
                            view! {
                                <div class="empty-state">
                                    "Send a message to start chatting"
                                </div>
                            }
                                .into_any()
                        } else {
                            engine
                                .messages()
                                .iter()
                                .map(|msg| {
                                    view! {
                                        <MessageBubble
                                            role=msg.role.as_str()
                                            content=msg.content.clone()
                                        />
                                    }
                                })
                                .collect_view()
                                .into_any()
                        }
                    })
                }}
            </div>

            // Input area
            <ChatInput />

            // Conversation footer
            {move || {
                state
                    .engine
                    .with(|engine| engine.conversation_id().map(str::to_owned))
                    .map(|cid| {
                        view! {
                            <p class="conversation-id">"Conversation ID: " {cid}</p>
                        }
                    })
            }}
        </main>
    }
}

/// A single chat message bubble.
#[component]
fn MessageBubble(role: &'static str, content: String) -> impl IntoView {
    let css_class = if role == "user" { "message user" } else { "message assistant" };

    view! {
        <div class=css_class>
            <div class="role-label">{role}</div>
            <div class="message-bubble">{content}</div>
        </div>
    }
}

/// Chat input with textarea and send button.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());

    let is_sending = move || state.engine.with(|engine| engine.loading());

    let send = move || {
        let text = input.get().trim().to_string();
        if text.is_empty() || is_sending() {
            return;
        }
        set_input.set(String::new());
        state.send_message(text);
    };

    let send_clone = send.clone();
    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send_clone();
        }
    };

    let on_submit = move |_| {
        send();
    };

    view! {
        <div class="input-area">
            <div class="input-row">
                <textarea
                    rows="1"
                    placeholder="Type a message… (Enter to send, Shift+Enter for newline)"
                    prop:value=input
                    on:input=move |ev| {
                        set_input.set(event_target_value(&ev));
                    }
                    on:keydown=on_keydown
                    disabled=is_sending
                />
                <button
                    class="send-btn"
                    on:click=on_submit
                    disabled=move || is_sending() || input.get().trim().is_empty()
                >
                    {move || if is_sending() { "Sending…" } else { "Send" }}
                </button>
            </div>
        </div>
    }
}
