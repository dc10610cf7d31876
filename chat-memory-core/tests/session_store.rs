use chat_memory_core::{Error, Role, SessionMemoryStore};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use std::thread;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[test]
fn test_lazy_creation_via_append_and_get_or_create() {
    let store = SessionMemoryStore::new();
    assert!(!store.list_session_ids().contains("a"));
    assert!(!store.list_session_ids().contains("b"));

    store.windowed_view("a", 3);
    store.history("a");
    assert!(!store.list_session_ids().contains("a"));

    store.get_or_create("a").unwrap();
    store.append("b", "user", "hi", at(1)).unwrap();

    let ids = store.list_session_ids();
    assert!(ids.contains("a"));
    assert!(ids.contains("b"));
}

#[test]
fn test_window_bound_holds_for_every_k() {
    let store = SessionMemoryStore::new();
    let script = [
        ("user", "q1"),
        ("bot", "a1"),
        ("user", "q2"),
        ("user", "q3"),
        ("bot", "a3"),
        ("bot", "a3 again"),
        ("user", "q4"),
    ];
    for (i, (role, content)) in script.iter().enumerate() {
        store.append("s", role, *content, at(i as i64)).unwrap();
    }

    let history = store.history("s");
    let total_exchanges = store.sessions()[0].exchange_count;
    assert_eq!(total_exchanges, 5);

    for k in 0..8 {
        let view = store.windowed_view("s", k);
        // Always a suffix of the history
        assert_eq!(view.as_slice(), &history[history.len() - view.len()..]);
        if k >= total_exchanges {
            assert_eq!(view, history);
        }
    }
    assert!(store.windowed_view("s", 0).is_empty());
    assert_eq!(store.windowed_view("s", 1).len(), 1);
    assert_eq!(store.windowed_view("s", 2).len(), 2);
    assert_eq!(store.windowed_view("s", 3).len(), 4);
}

#[test]
fn test_out_of_order_never_mutates() {
    let store = SessionMemoryStore::new();
    store.append("s", "user", "first", at(10)).unwrap();
    store.append("s", "bot", "second", at(10)).unwrap();

    for secs in [0, 5, 9] {
        let err = store.append("s", "user", "late", at(secs)).unwrap_err();
        match err {
            Error::OutOfOrderTimestamp {
                session,
                last,
                attempted,
            } => {
                assert_eq!(session, "s");
                assert_eq!(last, at(10));
                assert_eq!(attempted, at(secs));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(store.history("s").len(), 2);
}

#[test]
fn test_evict_then_recreate_starts_empty() {
    let store = SessionMemoryStore::new();
    store.append("s", "user", "old", at(100)).unwrap();
    store.evict("s");
    store.evict("s");
    assert!(!store.list_session_ids().contains("s"));

    // Earlier timestamp is fine again: the old history is gone
    store.append("s", "user", "new", at(1)).unwrap();
    let history = store.history("s");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content(), "new");
}

#[test]
fn test_concurrent_appends_across_sessions() {
    let store = Arc::new(SessionMemoryStore::new());
    let base = at(0);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let id = format!("session-{}", t);
                for i in 0..100 {
                    let role = if i % 2 == 0 { Role::User } else { Role::Bot };
                    store
                        .push(&id, role, format!("m{}", i), base + Duration::seconds(i))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 8);
    for t in 0..8 {
        let id = format!("session-{}", t);
        assert_eq!(store.history(&id).len(), 100);
        assert_eq!(store.windowed_view(&id, 3).len(), 6);
    }
}

#[test]
fn test_concurrent_appends_to_one_session_stay_ordered() {
    let store = Arc::new(SessionMemoryStore::new());
    let base = at(0);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut accepted = 0;
                for i in 0..50 {
                    let ts = base + Duration::seconds(i * 4 + t);
                    if store.push("shared", Role::User, "x", ts).is_ok() {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let history = store.history("shared");
    assert_eq!(history.len(), accepted);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].timestamp() <= pair[1].timestamp()));
}
