use std::sync::Arc;

use bytes::Bytes;
use dashframe_client::Client;
use dashframe_engine::render::NullRenderer;
use dashframe_engine::{ApplyOutcome, Engine, EngineError, SessionEnd, TodoError, WidgetKey};
use dashframe_proto::{FrameError, builders, encode, encode_line};
use frame_bus::{FrameReader, FrameReceiver, channel};
use serde_json::json;

fn session() -> (Client, FrameReceiver) {
    let (transport, receiver) = channel(128);
    (Client::new(Arc::new(transport)).with_session("s1"), receiver)
}

fn apply_all(engine: &mut Engine, receiver: &FrameReceiver) -> Vec<Result<ApplyOutcome, EngineError>> {
    let mut outcomes = Vec::new();
    while let Some(bytes) = receiver.try_recv() {
        outcomes.push(engine.apply_bytes(&bytes));
    }
    outcomes
}

#[test]
fn same_draw_twice_yields_version_two_with_that_payload() {
    let (client, receiver) = session();
    client.text("clock", "12:00").unwrap();
    client.text("clock", "12:00").unwrap();

    let mut engine = Engine::default();
    apply_all(&mut engine, &receiver);

    let widgets = &engine.state().widgets;
    assert_eq!(widgets.len(), 1);
    let widget = widgets.get(&WidgetKey::new("s1", "clock")).unwrap();
    assert_eq!(widget.version, 2);
    assert_eq!(
        serde_json::Value::Object(widget.value()),
        json!({"text": "12:00", "color": "white", "align": "center"})
    );
}

#[test]
fn reload_then_draw_starts_fresh() {
    let (client, receiver) = session();
    for _ in 0..3 {
        client.text("clock", "tick").unwrap();
    }
    client.image("logo", "/tmp/logo.png").unwrap();
    client.reload().unwrap();
    client.text("clock", "tock").unwrap();

    let mut engine = Engine::default();
    let outcomes = apply_all(&mut engine, &receiver);
    assert!(matches!(
        outcomes.last(),
        Some(Ok(ApplyOutcome::Drawn { version: 1, .. }))
    ));
    let widgets = &engine.state().widgets;
    assert_eq!(widgets.len(), 1);
    assert!(widgets.get(&WidgetKey::new("s1", "logo")).is_none());
}

#[test]
fn unknown_actions_leave_widgets_alone() {
    let mut engine = Engine::default();
    let draw = encode(&builders::text("w", "hello", &Default::default()).into_envelope("s1")).unwrap();
    engine.apply_bytes(&draw).unwrap();

    let unknown = br#"{"id":"s1","action":"unsupported_x","name":"w","value":"{\"text\":\"changed\"}"}"#;
    let outcome = engine.apply_bytes(unknown).unwrap();
    assert!(matches!(outcome, ApplyOutcome::Ignored(action) if action.as_str() == "unsupported_x"));

    let widget = engine.state().widgets.get(&WidgetKey::new("s1", "w")).unwrap();
    assert_eq!(widget.version, 1);
    assert_eq!(widget.value()["text"], "hello");
}

#[test]
fn todos_keep_call_order_and_mark_only_the_target() {
    let (client, receiver) = session();
    for n in 0..5 {
        client.todo_add(&format!("t{n}"), &format!("item {n}"), "alice", 1_700_000_000 + n).unwrap();
    }
    client.todo_done(3).unwrap();

    let mut engine = Engine::default();
    apply_all(&mut engine, &receiver);

    let items: Vec<_> = engine.state().todos.iter().collect();
    assert_eq!(items.len(), 5);
    for (n, item) in items.iter().enumerate() {
        assert_eq!(item.text, format!("item {n}"));
        assert_eq!(item.done, n == 3);
    }
}

#[test]
fn delete_then_done_hits_the_shifted_item() {
    let (client, receiver) = session();
    client.todo_add("a", "first", "", 0).unwrap();
    client.todo_add("b", "second", "", 0).unwrap();
    client.todo_add("c", "third", "", 0).unwrap();
    client.todo_del(1).unwrap();
    client.todo_done(1).unwrap();

    let mut engine = Engine::default();
    apply_all(&mut engine, &receiver);

    let items: Vec<_> = engine
        .state()
        .todos
        .iter()
        .map(|item| (item.text.as_str(), item.done))
        .collect();
    assert_eq!(items, [("first", false), ("third", true)]);
}

#[test]
fn index_equal_to_len_is_rejected_without_side_effects() {
    let (client, receiver) = session();
    client.todo_add("a", "only", "", 0).unwrap();
    client.todo_done(1).unwrap();
    client.todo_del(1).unwrap();

    let mut engine = Engine::default();
    let outcomes = apply_all(&mut engine, &receiver);
    for outcome in &outcomes[1..] {
        assert!(matches!(
            outcome,
            Err(EngineError::Todo(TodoError::IndexOutOfRange { index: 1, len: 1 }))
        ));
    }
    let todos = &engine.state().todos;
    assert_eq!(todos.len(), 1);
    assert!(!todos.iter().any(|item| item.done));
}

#[test]
fn add_add_delete_leaves_the_second_item() {
    let (client, receiver) = session();
    client.todo_add("t1", "Buy milk", "alice", 1_700_000_000).unwrap();
    client.todo_add("t2", "Ship release", "bob", 1_700_003_600).unwrap();
    client.todo_del(0).unwrap();

    let mut engine = Engine::default();
    apply_all(&mut engine, &receiver);

    let items: Vec<_> = engine.state().todos.iter().collect();
    assert_eq!(items.len(), 1);
    let item = items[0];
    assert_eq!(item.text, "Ship release");
    assert_eq!(item.by, "bob");
    assert_eq!(item.deadline, 1_700_003_600);
    assert!(!item.done);
    assert_eq!(item.name, "t2");
}

#[test]
fn fractional_deadline_keeps_later_indices_aligned() {
    let mut engine = Engine::default();
    engine
        .apply_bytes(br#"{"id":"t1","action":"todo_add","name":"","value":"{\"text\":\"first\",\"by\":\"a\",\"deadline\":1700000000.5}"}"#)
        .unwrap();
    engine
        .apply_bytes(br#"{"id":"t2","action":"todo_add","name":"","value":"{\"text\":\"second\",\"by\":\"b\",\"deadline\":1700003600}"}"#)
        .unwrap();
    engine
        .apply_bytes(br#"{"action":"todo_done","value":"{\"index\":1}"}"#)
        .unwrap();

    let items: Vec<_> = engine.state().todos.iter().collect();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].deadline, 1_700_000_000);
    assert!(!items[0].done);
    assert_eq!(items[1].text, "second");
    assert!(items[1].done);
}

#[test]
fn snapshot_reports_widget_values_as_sent() {
    let mut engine = Engine::default();
    engine
        .apply_bytes(br#"{"action":"chart","name":"cpu","value":"{\"data\":[[0,1],[2,3]],\"x_bounds\":[0,10],\"color\":null}"}"#)
        .unwrap();
    let snapshot = engine.state().snapshot();
    assert_eq!(
        snapshot["widgets"][0]["value"],
        json!({"data": [[0, 1], [2, 3]], "x_bounds": [0, 10], "color": null})
    );
}

#[test]
fn malformed_line_mid_stream_is_skipped() {
    let mut wire = Vec::new();
    let text = builders::text("w", "before", &Default::default()).into_envelope("");
    wire.extend(encode_line(&text).unwrap());
    wire.extend_from_slice(b"{\"action\": \"text\", \"value\": \"{broken\"}\n");
    wire.extend_from_slice(b"this is not json\n");
    let print = builders::print("after").into_envelope("");
    wire.extend(encode_line(&print).unwrap());
    wire.extend(encode_line(&builders::exit().into_envelope("")).unwrap());
    wire.extend(encode_line(&print).unwrap());

    let mut engine = Engine::default();
    let mut renderer = NullRenderer::default();
    let end = engine
        .run(FrameReader::new(wire.as_slice()), &mut renderer)
        .unwrap();

    assert_eq!(end, SessionEnd::Exit);
    let state = engine.state();
    assert_eq!(state.stats.skipped, 2);
    assert_eq!(state.console.len(), 1);
    assert_eq!(state.widgets.len(), 1);
    assert_eq!(renderer.draws(), 5);
}

#[test]
fn decode_errors_surface_as_malformed_frames() {
    let mut engine = Engine::default();
    let err = engine
        .apply_bytes(br#"{"action":"todo_done","value":"{\"index\":\"zero\"}"}"#)
        .unwrap_err();
    assert!(matches!(err, EngineError::Frame(FrameError::MalformedFrame(_))));
}

#[test]
fn source_end_without_exit_is_a_disconnect() {
    let (client, receiver) = session();
    client.print("last words").unwrap();
    drop(client);

    let mut engine = Engine::default();
    let frames = receiver.into_inner().into_iter().map(Ok::<Bytes, _>);
    let end = engine.run(frames, &mut NullRenderer::default()).unwrap();
    assert_eq!(end, SessionEnd::Disconnected);
    assert!(engine.state().stats.source_closed);
}
