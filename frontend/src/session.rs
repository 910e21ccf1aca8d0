//! Stream session lifecycle: `Idle → Streaming → {Completed | Aborted}`.
//!
//! [`ChatEngine`] owns the transcript and the per-session flags and is pure
//! data + transitions; the transport layer (`sse.rs`) and the reactive layer
//! (`state.rs`) are thin adapters around it. Handlers run to completion on
//! the single-threaded event loop, so the engine needs no locking.

use crate::merge::{collapse_repeated_words, merge_by_overlap};
use crate::models::{Message, Role, StreamEvent};

/// Transport connection state at the moment an error event fires, mapped
/// from `EventSource.readyState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    /// Automatic reconnect pending.
    Connecting,
    Open,
    /// Hard-closed, no reconnect coming.
    Closed,
}

/// What the caller should do after feeding an event to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// Terminal event applied; close the connection.
    Close,
}

/// How a transport-level error was classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Session already over; nothing to do.
    Ignore,
    /// Upstream finished without an explicit end event; treated as normal
    /// completion, never surfaced to the user.
    CompleteQuietly,
    /// Genuine failure: close, keep whatever partial content is shown.
    Abort,
}

#[derive(Clone, Debug, Default)]
pub struct ChatEngine {
    messages: Vec<Message>,
    conversation_id: Option<String>,
    loading: bool,
    ended: bool,
    saw_fragment: bool,
}

impl ChatEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// True while a stream session is in flight.
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Starts a new stream session for `text`.
    ///
    /// Returns `false` without touching any state when the input is blank or
    /// a session is already active — one session at a time, no queuing.
    pub fn begin_query(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.loading {
            return false;
        }
        self.ended = false;
        self.saw_fragment = false;
        self.messages.push(Message::user(text));
        self.messages.push(Message::assistant(""));
        self.loading = true;
        true
    }

    /// Folds one parsed stream event into the session.
    pub fn apply_event(&mut self, event: StreamEvent) -> Control {
        match event {
            StreamEvent::Answer { text } => {
                if self.ended {
                    return Control::Continue;
                }
                self.saw_fragment = true;
                if let Some(last) = self.messages.last_mut() {
                    if last.role == Role::Assistant {
                        let merged = merge_by_overlap(&last.content, &text);
                        last.content = collapse_repeated_words(&merged);
                    }
                }
                Control::Continue
            }
            StreamEvent::End { conversation_id } => {
                if !self.ended {
                    if let Some(cid) = conversation_id {
                        self.conversation_id = Some(cid);
                    }
                    self.ended = true;
                    self.loading = false;
                }
                Control::Close
            }
            StreamEvent::Error { .. } => {
                // Relay-injected terminal error: the partial answer stays
                // visible, the session just stops being busy.
                self.loading = false;
                Control::Close
            }
        }
    }

    /// Classifies a transport-level error/disconnect.
    ///
    /// A reconnect-pending transport after at least one applied fragment
    /// means the upstream closed the socket after finishing but before an
    /// explicit end event; that is completion, not failure.
    pub fn on_transport_error(&mut self, state: TransportState) -> ErrorDisposition {
        if self.ended {
            return ErrorDisposition::Ignore;
        }
        if self.saw_fragment && state == TransportState::Connecting {
            self.ended = true;
            self.loading = false;
            return ErrorDisposition::CompleteQuietly;
        }
        self.loading = false;
        ErrorDisposition::Abort
    }

    /// Gives up on a session that never got a connection.
    pub fn abort(&mut self) {
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> StreamEvent {
        StreamEvent::Answer { text: text.into() }
    }

    #[test]
    fn cumulative_stream_ends_with_one_clean_assistant_message() {
        let mut engine = ChatEngine::new();
        assert!(engine.begin_query("Hi"));
        assert!(engine.loading());

        assert_eq!(engine.apply_event(answer("Hel")), Control::Continue);
        assert_eq!(engine.apply_event(answer("Hello")), Control::Continue);
        let end = StreamEvent::End { conversation_id: Some("c1".into()) };
        assert_eq!(engine.apply_event(end), Control::Close);

        assert_eq!(engine.messages().len(), 2);
        assert_eq!(engine.messages()[0], Message::user("Hi"));
        assert_eq!(engine.messages()[1], Message::assistant("Hello"));
        assert_eq!(engine.conversation_id(), Some("c1"));
        assert!(!engine.loading());
    }

    #[test]
    fn delta_fragments_accumulate() {
        let mut engine = ChatEngine::new();
        engine.begin_query("Hi");
        engine.apply_event(answer("Hello, "));
        engine.apply_event(answer("world"));
        assert_eq!(engine.messages()[1].content, "Hello, world");
    }

    #[test]
    fn overlapping_resend_does_not_stutter() {
        let mut engine = ChatEngine::new();
        engine.begin_query("Hi");
        engine.apply_event(answer("the cat sat"));
        engine.apply_event(answer("sat on the mat"));
        assert_eq!(engine.messages()[1].content, "the cat sat on the mat");
    }

    #[test]
    fn hard_close_mid_stream_is_a_genuine_failure_that_keeps_partial_text() {
        let mut engine = ChatEngine::new();
        engine.begin_query("Hi");
        engine.apply_event(answer("Hel"));

        let disposition = engine.on_transport_error(TransportState::Closed);
        assert_eq!(disposition, ErrorDisposition::Abort);
        assert!(!engine.loading());
        assert_eq!(engine.messages().len(), 2);
        assert_eq!(engine.messages()[1].content, "Hel");
        assert_eq!(engine.conversation_id(), None);
    }

    #[test]
    fn error_before_any_fragment_is_a_genuine_failure() {
        let mut engine = ChatEngine::new();
        engine.begin_query("Hi");
        let disposition = engine.on_transport_error(TransportState::Connecting);
        assert_eq!(disposition, ErrorDisposition::Abort);
        assert!(!engine.loading());
    }

    #[test]
    fn reconnect_after_fragments_counts_as_completion() {
        let mut engine = ChatEngine::new();
        engine.begin_query("Hi");
        engine.apply_event(answer("done"));

        let disposition = engine.on_transport_error(TransportState::Connecting);
        assert_eq!(disposition, ErrorDisposition::CompleteQuietly);
        assert!(!engine.loading());
        assert_eq!(engine.messages()[1].content, "done");

        // Any further transport noise is a no-op.
        assert_eq!(
            engine.on_transport_error(TransportState::Closed),
            ErrorDisposition::Ignore
        );
    }

    #[test]
    fn terminal_transitions_are_idempotent() {
        let mut engine = ChatEngine::new();
        engine.begin_query("Hi");
        engine.apply_event(StreamEvent::End { conversation_id: Some("c1".into()) });
        assert_eq!(
            engine.apply_event(StreamEvent::End { conversation_id: Some("c2".into()) }),
            Control::Close
        );
        assert_eq!(engine.conversation_id(), Some("c1"));
        assert_eq!(
            engine.on_transport_error(TransportState::Connecting),
            ErrorDisposition::Ignore
        );
    }

    #[test]
    fn fragments_after_end_are_ignored() {
        let mut engine = ChatEngine::new();
        engine.begin_query("Hi");
        engine.apply_event(answer("Hello"));
        engine.apply_event(StreamEvent::End { conversation_id: None });
        engine.apply_event(answer("Hello again"));
        assert_eq!(engine.messages()[1].content, "Hello");
    }

    #[test]
    fn second_query_is_rejected_while_streaming() {
        let mut engine = ChatEngine::new();
        assert!(engine.begin_query("first"));
        assert!(!engine.begin_query("second"));
        // No second user message, no second assistant placeholder.
        assert_eq!(engine.messages().len(), 2);
    }

    #[test]
    fn blank_query_is_rejected() {
        let mut engine = ChatEngine::new();
        assert!(!engine.begin_query("   "));
        assert!(engine.messages().is_empty());
        assert!(!engine.loading());
    }

    #[test]
    fn conversation_id_carries_over_to_the_next_session() {
        let mut engine = ChatEngine::new();
        engine.begin_query("first");
        engine.apply_event(StreamEvent::End { conversation_id: Some("c1".into()) });

        assert!(engine.begin_query("second"));
        assert_eq!(engine.conversation_id(), Some("c1"));
        assert_eq!(engine.messages().len(), 4);

        // A later terminal event may overwrite the identifier.
        engine.apply_event(StreamEvent::End { conversation_id: Some("c2".into()) });
        assert_eq!(engine.conversation_id(), Some("c2"));
    }

    #[test]
    fn relay_error_event_stops_the_session_but_keeps_partial_text() {
        let mut engine = ChatEngine::new();
        engine.begin_query("Hi");
        engine.apply_event(answer("partial"));
        let control = engine.apply_event(StreamEvent::Error { message: "upstream died".into() });
        assert_eq!(control, Control::Close);
        assert!(!engine.loading());
        assert_eq!(engine.messages()[1].content, "partial");
    }

    #[test]
    fn replace_style_fragment_supersedes_the_buffer() {
        let mut engine = ChatEngine::new();
        engine.begin_query("Hi");
        engine.apply_event(answer("Hello wor"));
        engine.apply_event(answer("Hello world, revised"));
        assert_eq!(engine.messages()[1].content, "Hello world, revised");
    }

    #[test]
    fn seam_stutter_is_collapsed() {
        let mut engine = ChatEngine::new();
        engine.begin_query("Hi");
        engine.apply_event(answer("the cat"));
        engine.apply_event(answer("cat cat sat"));
        // The overlap merge yields "the cat cat sat"; the cleanup pass drops
        // the doubled word.
        assert_eq!(engine.messages()[1].content, "the cat sat");
    }
}
