#[cfg(test)]
mod tests {
    use crate::accumulator::*;
    use crate::conversation::ConversationState;
    use crate::event_bus::EventBus;
    use crate::ports::*;
    use crate::session::{ChatSession, SessionState};
    use chat_types::config::AssistantConfig;
    use chat_types::event::{ChatEvent, StreamEvent};
    use chat_types::message::*;
    use chat_types::{ChatError, LogError};
    use async_trait::async_trait;
    use futures::executor::block_on;
    use futures::stream::{self, StreamExt};
    use std::cell::RefCell;

    // ─── EventBus Tests ──────────────────────────────────────

    #[test]
    fn test_event_bus_new_is_empty() {
        let bus = EventBus::new();
        assert!(!bus.has_pending());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_emit_and_drain() {
        let bus = EventBus::new();
        bus.emit(ChatEvent::EvaluationStart);
        bus.emit(ChatEvent::ReplyComplete { text: "hello".to_string() });

        assert!(bus.has_pending());

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert!(!bus.has_pending());
    }

    #[test]
    fn test_event_bus_clone_shares_state() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        bus1.emit(ChatEvent::Logged);
        assert!(bus2.has_pending());

        let events = bus2.drain();
        assert_eq!(events.len(), 1);
        assert!(!bus1.has_pending());
    }

    #[test]
    fn test_event_bus_drains_in_emission_order() {
        let bus = EventBus::default();
        bus.emit(ChatEvent::TurnStart { turn_id: 1, input: "Hi".to_string() });
        bus.emit(ChatEvent::ReplySnapshot { text: "H".to_string() });
        bus.emit(ChatEvent::TurnEnd { turn_id: 1 });

        let events = bus.drain();
        assert!(matches!(events[0], ChatEvent::TurnStart { .. }));
        assert!(matches!(events[1], ChatEvent::ReplySnapshot { .. }));
        assert!(matches!(events[2], ChatEvent::TurnEnd { turn_id: 1 }));
        assert!(bus.drain().is_empty());
    }

    // ─── Accumulator Tests ───────────────────────────────────

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::text_delta(text)
    }

    fn other() -> StreamEvent {
        StreamEvent::other("thread.run.step.created")
    }

    fn snapshots_of(events: Vec<StreamEvent>) -> Vec<String> {
        block_on(accumulate(stream::iter(events)).collect::<Vec<_>>())
    }

    #[test]
    fn test_accumulator_push() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.push(&delta("Hel")), "Hel");
        assert_eq!(acc.push(&other()), "Hel");
        assert_eq!(acc.push(&delta("lo!")), "Hello!");
        assert_eq!(acc.delta_count(), 2);
        assert_eq!(acc.into_text(), "Hello!");
    }

    #[test]
    fn test_snapshots_scenario() {
        let snaps = snapshots_of(vec![delta("Hel"), other(), delta("lo!")]);
        assert_eq!(snaps, vec!["Hel", "Hel", "Hello!"]);
    }

    #[test]
    fn test_snapshots_without_deltas_end_empty() {
        let mut snapshots = accumulate(stream::iter(vec![other(), other()]));
        let snaps: Vec<String> = block_on(snapshots.by_ref().collect());
        assert!(snaps.iter().all(|s| s.is_empty()));
        assert_eq!(snapshots.delta_count(), 0);
        assert_eq!(snapshots.text(), "");
    }

    #[test]
    fn test_snapshots_of_empty_stream() {
        assert!(snapshots_of(Vec::new()).is_empty());
        assert_eq!(block_on(collect_reply(stream::iter(Vec::new()))).unwrap(), "");
    }

    #[test]
    fn test_final_snapshot_is_concatenation_in_order() {
        let events = vec![
            other(),
            delta("a"),
            delta(""),
            other(),
            delta("bc"),
            delta("a"),
            other(),
        ];
        let expected: String = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::TextDelta { text } => Some(text.as_str()),
                StreamEvent::Other { .. } | StreamEvent::Failed { .. } => None,
            })
            .collect();

        let snaps = snapshots_of(events.clone());
        assert_eq!(snaps.len(), events.len());
        assert_eq!(snaps.last().unwrap(), &expected);
        assert_eq!(block_on(collect_reply(stream::iter(events))).unwrap(), "abca");
    }

    #[test]
    fn test_snapshot_lengths_never_decrease() {
        let snaps = snapshots_of(vec![delta("x"), other(), delta("yy"), delta(""), delta("z")]);
        for pair in snaps.windows(2) {
            assert!(pair[0].len() <= pair[1].len());
            assert!(pair[1].starts_with(&pair[0]));
        }
    }

    #[test]
    fn test_snapshots_are_not_restartable() {
        use futures::stream::FusedStream;

        let mut snapshots = accumulate(stream::iter(vec![delta("a")]));
        assert_eq!(block_on(snapshots.next()), Some("a".to_string()));
        assert_eq!(block_on(snapshots.next()), None);
        assert!(snapshots.is_terminated());
        assert_eq!(block_on(snapshots.next()), None);
        assert_eq!(snapshots.text(), "a");
    }

    fn failed() -> StreamEvent {
        StreamEvent::failed("error: server_error")
    }

    #[test]
    fn test_failed_event_ends_snapshots() {
        use futures::stream::FusedStream;

        let mut snapshots = accumulate(stream::iter(vec![delta("Hel"), failed(), delta("lo!")]));
        let snaps: Vec<String> = block_on(snapshots.by_ref().collect());
        assert_eq!(snaps, vec!["Hel"]);
        assert!(snapshots.is_terminated());
        assert_eq!(snapshots.failure(), Some("error: server_error"));
        assert_eq!(
            snapshots.finish(),
            Err(ChatError::ServiceUnavailable("error: server_error".to_string()))
        );
    }

    #[test]
    fn test_collect_reply_reports_failure() {
        let err = block_on(collect_reply(stream::iter(vec![delta("partial"), failed()]))).unwrap_err();
        assert!(matches!(err, ChatError::ServiceUnavailable(_)));
    }

    // ─── Mock ports ──────────────────────────────────────────

    /// Mock assistant that replays scripted runs, one per `run_streaming` call
    struct MockAssistant {
        runs: RefCell<Vec<Vec<StreamEvent>>>,
        created: RefCell<usize>,
        posted: RefCell<Vec<(String, Role, String)>>,
        run_calls: RefCell<Vec<(String, String)>>,
        fail_create: bool,
        fail_post: bool,
        fail_run: bool,
    }

    impl MockAssistant {
        fn new(runs: Vec<Vec<StreamEvent>>) -> Self {
            Self {
                runs: RefCell::new(runs),
                created: RefCell::new(0),
                posted: RefCell::new(Vec::new()),
                run_calls: RefCell::new(Vec::new()),
                fail_create: false,
                fail_post: false,
                fail_run: false,
            }
        }
    }

    #[async_trait(?Send)]
    impl AssistantPort for MockAssistant {
        async fn create_thread(&self) -> chat_types::Result<String> {
            if self.fail_create {
                return Err(ChatError::ServiceUnavailable("HTTP 503".to_string()));
            }
            *self.created.borrow_mut() += 1;
            Ok(format!("thread_{}", self.created.borrow()))
        }

        async fn post_message(&self, thread_id: &str, role: Role, content: &str) -> chat_types::Result<()> {
            if self.fail_post {
                return Err(ChatError::ServiceUnavailable("HTTP 500".to_string()));
            }
            self.posted
                .borrow_mut()
                .push((thread_id.to_string(), role, content.to_string()));
            Ok(())
        }

        async fn run_streaming(&self, thread_id: &str, assistant_id: &str) -> chat_types::Result<EventStream> {
            self.run_calls
                .borrow_mut()
                .push((thread_id.to_string(), assistant_id.to_string()));
            if self.fail_run {
                return Err(ChatError::ServiceUnavailable("HTTP 429: rate limited".to_string()));
            }
            let mut runs = self.runs.borrow_mut();
            let events = if runs.is_empty() { Vec::new() } else { runs.remove(0) };
            Ok(Box::pin(stream::iter(events)))
        }
    }

    /// Mock logger that records submissions and returns a fixed result
    struct MockLogger {
        result: Result<(), LogError>,
        submitted: RefCell<Vec<(String, String)>>,
    }

    impl MockLogger {
        fn new(result: Result<(), LogError>) -> Self {
            Self {
                result,
                submitted: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl LogPort for MockLogger {
        async fn submit(&self, transcript: &str, evaluation: &str) -> Result<(), LogError> {
            self.submitted
                .borrow_mut()
                .push((transcript.to_string(), evaluation.to_string()));
            self.result.clone()
        }
    }

    fn assistant_config() -> AssistantConfig {
        AssistantConfig {
            api_key: "sk-test".to_string(),
            api_base: None,
            chat_assistant_id: "asst_chat".to_string(),
            eval_assistant_id: "asst_eval".to_string(),
        }
    }

    // ─── ConversationState Tests ─────────────────────────────

    #[test]
    fn test_conversation_starts_empty() {
        let conv = ConversationState::new();
        assert!(conv.thread_id().is_none());
        assert!(conv.is_empty());
        assert_eq!(conv.render_as_text(), "");
    }

    #[test]
    fn test_ensure_thread_is_idempotent() {
        let assistant = MockAssistant::new(Vec::new());
        let mut conv = ConversationState::new();

        let first = block_on(conv.ensure_thread(&assistant)).unwrap();
        let second = block_on(conv.ensure_thread(&assistant)).unwrap();

        assert_eq!(first, second);
        assert_eq!(*assistant.created.borrow(), 1);
        assert_eq!(conv.thread_id(), Some(first.as_str()));
    }

    #[test]
    fn test_ensure_thread_failure_leaves_state_unchanged() {
        let mut assistant = MockAssistant::new(Vec::new());
        assistant.fail_create = true;
        let mut conv = ConversationState::new();

        let err = block_on(conv.ensure_thread(&assistant)).unwrap_err();
        assert!(matches!(err, ChatError::ServiceUnavailable(_)));
        assert!(conv.thread_id().is_none());
    }

    #[test]
    fn test_render_as_text_scenario() {
        let mut conv = ConversationState::new();
        conv.append(Role::User, "Hi");
        conv.append(Role::Assistant, "Hello");
        assert_eq!(conv.render_as_text(), "User: Hi\nAssistant: Hello");
    }

    #[test]
    fn test_render_as_text_one_line_per_message() {
        let mut conv = ConversationState::new();
        conv.append(Role::User, "one");
        conv.append(Role::Assistant, "two");
        conv.append(Role::User, "three");

        let text = conv.render_as_text();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), conv.len());
        assert_eq!(lines, vec!["User: one", "Assistant: two", "User: three"]);
    }

    // ─── ChatSession Tests ───────────────────────────────────

    #[test]
    fn test_session_initial_state() {
        let session = ChatSession::new(assistant_config(), EventBus::new());
        assert_eq!(session.state, SessionState::Idle);
        assert!(session.conversation.is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_run_turn_appends_user_then_reply() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let assistant = MockAssistant::new(vec![vec![delta("Hel"), other(), delta("lo!")]]);

        block_on(session.run_turn("Hi", &assistant)).unwrap();

        let messages = session.conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::user("Hi"));
        assert_eq!(messages[1], Message::assistant("Hello!"));
        assert_eq!(session.transcript(), "User: Hi\nAssistant: Hello!");
        assert_eq!(session.state, SessionState::Idle);

        let posted = assistant.posted.borrow();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0], ("thread_1".to_string(), Role::User, "Hi".to_string()));
        assert_eq!(
            assistant.run_calls.borrow()[0],
            ("thread_1".to_string(), "asst_chat".to_string())
        );

        let snapshots: Vec<String> = bus
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                ChatEvent::ReplySnapshot { text } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(snapshots, vec!["Hel", "Hel", "Hello!"]);
    }

    #[test]
    fn test_run_turn_event_order() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let assistant = MockAssistant::new(vec![vec![delta("ok")]]);

        block_on(session.run_turn("Hi", &assistant)).unwrap();

        let events = bus.drain();
        assert!(matches!(events.first(), Some(ChatEvent::TurnStart { turn_id: 1, .. })));
        assert!(matches!(events.last(), Some(ChatEvent::TurnEnd { turn_id: 1 })));

        let user_pos = events
            .iter()
            .position(|e| matches!(e, ChatEvent::MessageAppended { message } if message.role == Role::User))
            .unwrap();
        let snapshot_pos = events
            .iter()
            .position(|e| matches!(e, ChatEvent::ReplySnapshot { .. }))
            .unwrap();
        let reply_pos = events
            .iter()
            .position(|e| matches!(e, ChatEvent::MessageAppended { message } if message.role == Role::Assistant))
            .unwrap();
        assert!(user_pos < snapshot_pos);
        assert!(snapshot_pos < reply_pos);
    }

    #[test]
    fn test_thread_reused_across_turns() {
        let mut session = ChatSession::new(assistant_config(), EventBus::new());
        let assistant = MockAssistant::new(vec![vec![delta("one")], vec![delta("two")]]);

        block_on(session.run_turn("first", &assistant)).unwrap();
        block_on(session.run_turn("second", &assistant)).unwrap();

        assert_eq!(*assistant.created.borrow(), 1);
        assert_eq!(session.conversation.len(), 4);
        assert!(assistant
            .posted
            .borrow()
            .iter()
            .all(|(thread, _, _)| thread == "thread_1"));
    }

    #[test]
    fn test_run_turn_thread_failure_appends_nothing() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let mut assistant = MockAssistant::new(Vec::new());
        assistant.fail_create = true;

        let err = block_on(session.run_turn("Hi", &assistant)).unwrap_err();
        assert!(matches!(err, ChatError::ServiceUnavailable(_)));
        assert!(session.conversation.is_empty());
        assert!(matches!(session.state, SessionState::Error(_)));

        let events = bus.drain();
        assert!(events.iter().any(|e| matches!(e, ChatEvent::Error { .. })));
        assert!(matches!(events.last(), Some(ChatEvent::TurnEnd { .. })));
    }

    #[test]
    fn test_run_turn_post_failure_keeps_user_message_only() {
        let mut session = ChatSession::new(assistant_config(), EventBus::new());
        let mut assistant = MockAssistant::new(vec![vec![delta("never")]]);
        assistant.fail_post = true;

        assert!(block_on(session.run_turn("Hi", &assistant)).is_err());
        assert_eq!(session.conversation.messages(), &[Message::user("Hi")]);
        assert!(assistant.run_calls.borrow().is_empty());
    }

    #[test]
    fn test_run_turn_empty_reply_is_still_appended() {
        let mut session = ChatSession::new(assistant_config(), EventBus::new());
        let assistant = MockAssistant::new(vec![vec![other()]]);

        block_on(session.run_turn("Hi", &assistant)).unwrap();
        assert_eq!(session.conversation.messages()[1], Message::assistant(""));
    }

    #[test]
    fn test_evaluation_with_empty_conversation() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let assistant = MockAssistant::new(Vec::new());

        let err = block_on(session.run_evaluation(&assistant, None)).unwrap_err();
        assert_eq!(err, ChatError::NothingToEvaluate);
        assert!(assistant.run_calls.borrow().is_empty());
        assert_eq!(session.state, SessionState::Idle);
        assert!(bus.drain().iter().any(|e| matches!(e, ChatEvent::Warning { .. })));
    }

    #[test]
    fn test_evaluation_logs_transcript_and_result() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let assistant = MockAssistant::new(vec![
            vec![delta("Hello")],
            vec![delta("Score: "), other(), delta("9/10")],
        ]);
        let logger = MockLogger::new(Ok(()));

        block_on(session.run_turn("Hi", &assistant)).unwrap();
        bus.drain();

        let outcome = block_on(session.run_evaluation(&assistant, Some(&logger))).unwrap();
        assert_eq!(outcome.transcript, "User: Hi\nAssistant: Hello");
        assert_eq!(outcome.evaluation, "Score: 9/10");
        assert_eq!(outcome.logged, Some(Ok(())));

        assert_eq!(
            logger.submitted.borrow()[0],
            ("User: Hi\nAssistant: Hello".to_string(), "Score: 9/10".to_string())
        );
        assert_eq!(
            assistant.run_calls.borrow()[1],
            ("thread_1".to_string(), "asst_eval".to_string())
        );
        // Evaluation text is not part of the conversation
        assert_eq!(session.conversation.len(), 2);

        let events = bus.drain();
        assert!(events.contains(&ChatEvent::Logged));
        assert!(events.contains(&ChatEvent::EvaluationComplete {
            text: "Score: 9/10".to_string()
        }));
    }

    #[test]
    fn test_evaluation_empty_reply_skips_logging() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let assistant = MockAssistant::new(vec![vec![delta("Hello")], vec![other(), delta("  \n")]]);
        let logger = MockLogger::new(Ok(()));

        block_on(session.run_turn("Hi", &assistant)).unwrap();
        bus.drain();

        let err = block_on(session.run_evaluation(&assistant, Some(&logger))).unwrap_err();
        assert_eq!(err, ChatError::EmptyReply);
        assert!(logger.submitted.borrow().is_empty());
        assert_eq!(session.state, SessionState::Idle);

        let events = bus.drain();
        assert!(events.iter().any(|e| matches!(e, ChatEvent::Warning { .. })));
        assert!(!events.iter().any(|e| matches!(e, ChatEvent::EvaluationComplete { .. })));
    }

    #[test]
    fn test_evaluation_log_rejection_is_reported() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let assistant = MockAssistant::new(vec![vec![delta("Hello")], vec![delta("Fine")]]);
        let logger = MockLogger::new(Err(LogError::Rejected("bad payload".to_string())));

        block_on(session.run_turn("Hi", &assistant)).unwrap();
        bus.drain();

        let outcome = block_on(session.run_evaluation(&assistant, Some(&logger))).unwrap();
        assert_eq!(outcome.evaluation, "Fine");
        assert_eq!(
            outcome.logged,
            Some(Err(LogError::Rejected("bad payload".to_string())))
        );

        let events = bus.drain();
        assert!(events.contains(&ChatEvent::Error {
            message: "Failed to log: bad payload".to_string()
        }));
        assert!(!events.contains(&ChatEvent::Logged));
    }

    #[test]
    fn test_evaluation_without_logger() {
        let mut session = ChatSession::new(assistant_config(), EventBus::new());
        let assistant = MockAssistant::new(vec![vec![delta("Hello")], vec![delta("Fine")]]);

        block_on(session.run_turn("Hi", &assistant)).unwrap();
        let outcome = block_on(session.run_evaluation(&assistant, None)).unwrap();
        assert_eq!(outcome.logged, None);
    }

    #[test]
    fn test_run_turn_start_failure_appends_no_reply() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let mut assistant = MockAssistant::new(Vec::new());
        assistant.fail_run = true;

        let err = block_on(session.run_turn("Hi", &assistant)).unwrap_err();
        assert!(matches!(err, ChatError::ServiceUnavailable(_)));
        assert_eq!(session.conversation.messages(), &[Message::user("Hi")]);
        assert!(matches!(session.state, SessionState::Error(_)));

        let events = bus.drain();
        assert!(!events.iter().any(|e| matches!(e, ChatEvent::ReplyComplete { .. })));
        assert!(events.iter().any(|e| matches!(e, ChatEvent::Error { .. })));
    }

    #[test]
    fn test_run_turn_failed_midstream_drops_partial_reply() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let assistant = MockAssistant::new(vec![vec![delta("Hel"), failed()]]);

        let err = block_on(session.run_turn("Hi", &assistant)).unwrap_err();
        assert_eq!(err, ChatError::ServiceUnavailable("error: server_error".to_string()));
        assert_eq!(session.conversation.messages(), &[Message::user("Hi")]);
        assert_eq!(session.transcript(), "User: Hi");

        let events = bus.drain();
        assert!(events.contains(&ChatEvent::ReplySnapshot { text: "Hel".to_string() }));
        assert!(!events.iter().any(|e| matches!(
            e,
            ChatEvent::MessageAppended { message } if message.role == Role::Assistant
        )));
        assert!(!events.iter().any(|e| matches!(e, ChatEvent::ReplyComplete { .. })));
        assert!(matches!(events.last(), Some(ChatEvent::TurnEnd { .. })));
    }

    #[test]
    fn test_turn_after_failed_run_reuses_thread() {
        let mut session = ChatSession::new(assistant_config(), EventBus::new());
        let assistant = MockAssistant::new(vec![vec![failed()], vec![delta("Back")]]);

        assert!(block_on(session.run_turn("Hi", &assistant)).is_err());
        block_on(session.run_turn("Again", &assistant)).unwrap();

        assert_eq!(*assistant.created.borrow(), 1);
        assert_eq!(session.transcript(), "User: Hi\nUser: Again\nAssistant: Back");
        assert_eq!(session.state, SessionState::Idle);
    }

    #[test]
    fn test_evaluation_start_failure_logs_nothing() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let mut assistant = MockAssistant::new(vec![vec![delta("Hello")]]);
        let logger = MockLogger::new(Ok(()));

        block_on(session.run_turn("Hi", &assistant)).unwrap();
        bus.drain();
        let before = session.conversation.clone();

        assistant.fail_run = true;
        let err = block_on(session.run_evaluation(&assistant, Some(&logger))).unwrap_err();
        assert!(matches!(err, ChatError::ServiceUnavailable(_)));
        assert_eq!(session.conversation, before);
        assert!(logger.submitted.borrow().is_empty());
        assert!(matches!(session.state, SessionState::Error(_)));

        let events = bus.drain();
        assert!(!events.iter().any(|e| matches!(e, ChatEvent::EvaluationComplete { .. })));
        assert!(!events.contains(&ChatEvent::Logged));
    }

    #[test]
    fn test_evaluation_failed_midstream_logs_nothing() {
        let bus = EventBus::new();
        let mut session = ChatSession::new(assistant_config(), bus.clone());
        let assistant = MockAssistant::new(vec![
            vec![delta("Hello")],
            vec![delta("Score: "), failed()],
        ]);
        let logger = MockLogger::new(Ok(()));

        block_on(session.run_turn("Hi", &assistant)).unwrap();
        bus.drain();
        let before = session.conversation.clone();

        let err = block_on(session.run_evaluation(&assistant, Some(&logger))).unwrap_err();
        assert_eq!(err, ChatError::ServiceUnavailable("error: server_error".to_string()));
        assert_eq!(session.conversation, before);
        assert!(logger.submitted.borrow().is_empty());

        let events = bus.drain();
        assert!(events.contains(&ChatEvent::EvaluationSnapshot { text: "Score: ".to_string() }));
        assert!(!events.iter().any(|e| matches!(e, ChatEvent::EvaluationComplete { .. })));
        assert!(events.iter().any(|e| matches!(e, ChatEvent::Error { .. })));
    }
}
