use super::{Message, MessageKind, MessageStore, Page};

fn msg(id: u64, timestamp: i64) -> Message {
    Message {
        id,
        timestamp,
        content: format!("message {id}"),
        kind: MessageKind::Ai,
    }
}

#[test]
fn test_store_new_is_empty() {
    let store = MessageStore::default();
    assert!(store.is_empty());
    assert_eq!(store.capacity(), MessageStore::CAPACITY);
}

#[test]
fn test_query_on_empty_store() {
    let store = MessageStore::default();
    let page = store.query(0);
    assert_eq!(
        page,
        Page {
            messages: vec![],
            last_timestamp: 0
        }
    );
}

#[test]
fn test_store_caps_at_capacity() {
    let mut store = MessageStore::default();
    for i in 1..=101 {
        store.append(msg(i, 1_000 + i as i64));
    }

    assert_eq!(store.len(), 100);
    let ids: Vec<u64> = store.iter().map(|m| m.id).collect();
    assert!(!ids.contains(&1));
    assert_eq!(ids.first(), Some(&2));
    assert_eq!(ids.last(), Some(&101));
}

#[test]
fn test_store_retains_most_recent_in_order() {
    let mut store = MessageStore::new(5);
    for i in 1..=23 {
        store.append(msg(i, i as i64 * 10));
        assert!(store.len() <= 5);
    }

    let ids: Vec<u64> = store.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![19, 20, 21, 22, 23]);
}

#[test]
fn test_query_is_strictly_greater_than() {
    let mut store = MessageStore::default();
    store.append(msg(1, 100));
    store.append(msg(2, 200));
    store.append(msg(3, 300));

    let page = store.query(200);
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].id, 3);
    assert_eq!(page.last_timestamp, 300);

    let page = store.query(99);
    let ids: Vec<u64> = page.messages.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(page.last_timestamp, 300);
}

#[test]
fn test_query_past_newest_keeps_cursor() {
    let mut store = MessageStore::default();
    store.append(msg(1, 100));

    let page = store.query(500);
    assert!(page.messages.is_empty());
    assert_eq!(page.last_timestamp, 500);
}

#[test]
fn test_query_keeps_insertion_order_on_ties() {
    let mut store = MessageStore::default();
    store.append(msg(1, 100));
    store.append(msg(2, 100));
    store.append(msg(3, 150));

    let page = store.query(0);
    let ids: Vec<u64> = page.messages.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_cursor_walk_sees_every_message_once() {
    let mut store = MessageStore::new(50);
    let mut cursor = 0;
    let mut seen = Vec::new();

    for batch in 0..10u64 {
        for i in 0..3u64 {
            let id = batch * 3 + i + 1;
            store.append(msg(id, id as i64 * 7));
        }
        let page = store.query(cursor);
        seen.extend(page.messages.iter().map(|m| m.id));
        cursor = page.last_timestamp;
    }

    let expected: Vec<u64> = (1..=30).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_message_wire_format() {
    let json = serde_json::to_value(msg(7, 1_700_000_000_000)).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    assert_eq!(json["type"], "ai");

    let page = serde_json::to_value(Page::default()).unwrap();
    assert_eq!(page["lastTimestamp"], 0);
    assert!(page["messages"].as_array().unwrap().is_empty());
}

#[test]
fn test_message_kind_from_tag() {
    assert_eq!(MessageKind::from_tag("user"), Some(MessageKind::User));
    assert_eq!(MessageKind::from_tag("ai"), Some(MessageKind::Ai));
    assert_eq!(MessageKind::from_tag("robot"), None);
}

#[test]
fn test_zero_capacity_keeps_newest() {
    let mut store = MessageStore::new(0);
    assert_eq!(store.capacity(), 1);

    store.append(msg(1, 10));
    store.append(msg(2, 20));
    assert_eq!(store.query(0).messages, vec![msg(2, 20)]);
}
