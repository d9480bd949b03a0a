#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use framerpc_core::protocol::frame::{decode_frame, encode_frame};
use framerpc_core::protocol::Reply;
use framerpc_core::{HandlerError, Value};
use framerpc_server::dispatch::Dispatcher;
use framerpc_server::handler::{HandlerRegistry, ServeHandlerDescription};
use framerpc_server::services::register_builtins;

use common::{message, Event, Harness, RecordingLog};

fn dispatcher(log: &RecordingLog) -> Dispatcher {
    let registry = HandlerRegistry::new();
    register_builtins(&registry);
    registry.register(
        "slow",
        ServeHandlerDescription::raw(|v| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(v)
        }),
    );
    registry.register(
        "fail",
        ServeHandlerDescription::raw(|_| Err(HandlerError::failed("nope"))),
    );
    Dispatcher::new(Arc::new(registry), Arc::new(log.clone()))
}

#[tokio::test]
async fn call_frame_round_trips_through_dispatch() {
    let h = Harness::new();
    let d = dispatcher(&h.log);

    let unit = d
        .dispatch_frame(message(&(0, 7, "echo", "hi")), &h.ctx)
        .await
        .unwrap()
        .unwrap();
    unit.await.unwrap();

    assert_eq!(
        h.tx.replies(),
        vec![Reply {
            seqno: 7,
            error: None,
            result: Some(Value::from("hi")),
        }]
    );
}

#[tokio::test]
async fn short_call_still_gets_an_error_reply() {
    let h = Harness::new();
    let d = dispatcher(&h.log);

    let unit = d
        .dispatch_frame(message(&(0, 7, "echo")), &h.ctx)
        .await
        .unwrap()
        .unwrap();
    unit.await.unwrap();

    let reply = &h.tx.replies()[0];
    assert_eq!(reply.seqno, 7);
    assert_eq!(reply.error, Some(Value::from("decode error: too few fields in message")));
}

#[tokio::test]
async fn surplus_fields_are_ignored() {
    let h = Harness::new();
    let d = dispatcher(&h.log);

    let unit = d
        .dispatch_frame(message(&(0, 1, "echo", "a", "extra")), &h.ctx)
        .await
        .unwrap()
        .unwrap();
    unit.await.unwrap();

    assert_eq!(h.tx.replies()[0].result, Some(Value::from("a")));
}

#[tokio::test]
async fn unknown_method_replies_method_not_found() {
    let h = Harness::new();
    let d = dispatcher(&h.log);

    let unit = d
        .dispatch_frame(message(&(0, 2, "ghost", ())), &h.ctx)
        .await
        .unwrap()
        .unwrap();
    unit.await.unwrap();

    assert_eq!(
        h.tx.replies()[0].error,
        Some(Value::from("method not found: ghost"))
    );
}

#[tokio::test]
async fn unknown_and_response_kinds_are_rejected() {
    let h = Harness::new();
    let d = dispatcher(&h.log);

    let err = d.dispatch_frame(message(&(9, 1, "x")), &h.ctx).await.unwrap_err();
    assert_eq!(err.code().as_str(), "UNKNOWN_KIND");

    let err = d
        .dispatch_frame(message(&(1, 1, (), ())), &h.ctx)
        .await
        .unwrap_err();
    assert_eq!(err.code().as_str(), "UNKNOWN_KIND");

    assert!(h.tx.replies().is_empty());
}

#[tokio::test]
async fn cancel_frame_yields_no_unit() {
    let h = Harness::new();
    let d = dispatcher(&h.log);

    let unit = d.dispatch_frame(message(&(3, 7, "slow")), &h.ctx).await.unwrap();

    assert!(unit.is_none());
    assert_eq!(
        h.log.events(),
        vec![Event::Cancel {
            seqno: 7,
            method: "slow".into(),
        }]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn admission_bounds_in_flight_work() {
    let h = Harness::new();
    let d = dispatcher(&h.log).with_limits(1, 1024 * 1024);

    let first = d
        .dispatch_frame(message(&(0, 1, "slow", "a")), &h.ctx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(d.in_flight(), 1);

    let second = tokio::time::timeout(
        Duration::from_millis(50),
        d.dispatch_frame(message(&(0, 2, "echo", "b")), &h.ctx),
    )
    .await;
    assert!(second.is_err(), "second dispatch should wait for a permit");

    first.await.unwrap();
    let second = d
        .dispatch_frame(message(&(0, 2, "echo", "b")), &h.ctx)
        .await
        .unwrap()
        .unwrap();
    second.await.unwrap();

    assert_eq!(d.in_flight(), 0);
    let seqnos: Vec<i64> = h.tx.replies().iter().map(|r| r.seqno).collect();
    assert_eq!(seqnos, vec![1, 2]);
}

async fn read_replies<R: tokio::io::AsyncRead + Unpin>(mut rd: R) -> Vec<Value> {
    let mut raw = Vec::new();
    rd.read_to_end(&mut raw).await.unwrap();

    let mut buf = BytesMut::from(&raw[..]);
    let mut out = Vec::new();
    while let Some(frame) = decode_frame(&mut buf, 1024 * 1024).unwrap() {
        out.push(rmpv::decode::read_value(&mut &frame[..]).unwrap());
    }
    assert!(buf.is_empty());
    out
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn connection_serves_until_eof_and_drains_replies() {
    let log = RecordingLog::default();
    let d = Arc::new(dispatcher(&log));

    let (client, server) = tokio::io::duplex(4096);
    let (server_rd, server_wr) = tokio::io::split(server);
    let (client_rd, mut client_wr) = tokio::io::split(client);

    let conn = {
        let d = Arc::clone(&d);
        tokio::spawn(async move { d.serve_connection(server_rd, server_wr).await })
    };

    let outbound = [
        message(&(0, 1, "slow", "first")),
        message(&(2, "echo", "fire and forget")),
        message(&(9, 0, "bogus")),
        message(&(3, 1, "slow")),
        message(&(0, 2, "ping", ())),
        message(&(0, 3, "fail", ())),
    ];
    for msg in outbound {
        client_wr.write_all(&encode_frame(&msg).unwrap()).await.unwrap();
    }
    client_wr.shutdown().await.unwrap();

    let replies = read_replies(client_rd).await;
    conn.await.unwrap().unwrap();

    let mut by_seqno: Vec<(i64, Value, Value)> = replies
        .into_iter()
        .map(|r| {
            let Value::Array(items) = r else {
                panic!("reply is not an array: {r:?}");
            };
            assert_eq!(items.len(), 4);
            assert_eq!(items[0], Value::from(1));
            (items[1].as_i64().unwrap(), items[2].clone(), items[3].clone())
        })
        .collect();
    by_seqno.sort_by_key(|(s, _, _)| *s);

    assert_eq!(
        by_seqno,
        vec![
            (1, Value::Nil, Value::from("first")),
            (2, Value::Nil, Value::from("pong")),
            (3, Value::from("nope"), Value::Nil),
        ]
    );

    let events = log.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Warning(w) if w.contains("unknown message kind: 9"))));
    assert!(events.contains(&Event::Cancel {
        seqno: 1,
        method: "slow".into(),
    }));
    assert!(events.contains(&Event::NotifyComplete {
        method: "echo".into(),
        err: None,
    }));
}

#[tokio::test]
async fn oversized_frame_ends_the_connection() {
    let log = RecordingLog::default();
    let d = dispatcher(&log).with_limits(8, 16);

    let (client, server) = tokio::io::duplex(4096);
    let (server_rd, server_wr) = tokio::io::split(server);
    let (_client_rd, mut client_wr) = tokio::io::split(client);

    let big = message(&(0, 1, "echo", "x".repeat(64)));
    client_wr.write_all(&encode_frame(&big).unwrap()).await.unwrap();

    let err = d.serve_connection(server_rd, server_wr).await.unwrap_err();
    assert_eq!(err.code().as_str(), "FRAME_TOO_LARGE");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stalled_reader_does_not_starve_other_connections() {
    let log = RecordingLog::default();
    let d = Arc::new(dispatcher(&log).with_limits(2, 1024 * 1024));

    // replies to A never get read, so its writes park on a full pipe
    let (a_client, a_server) = tokio::io::duplex(16);
    let (a_rd, a_wr) = tokio::io::split(a_server);
    let (_a_client_rd, mut a_client_wr) = tokio::io::split(a_client);
    {
        let d = Arc::clone(&d);
        tokio::spawn(async move { d.serve_connection(a_rd, a_wr).await });
    }
    for seqno in 1..=2 {
        let msg = message(&(0, seqno, "echo", "x".repeat(200)));
        a_client_wr.write_all(&encode_frame(&msg).unwrap()).await.unwrap();
    }

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let completed = log
                .events()
                .iter()
                .filter(|e| matches!(e, Event::Reply { .. }))
                .count();
            if completed == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("both handlers on A should finish");
    assert_eq!(d.in_flight(), 0);

    let (b_client, b_server) = tokio::io::duplex(4096);
    let (b_rd, b_wr) = tokio::io::split(b_server);
    let (b_client_rd, mut b_client_wr) = tokio::io::split(b_client);
    let conn_b = {
        let d = Arc::clone(&d);
        tokio::spawn(async move { d.serve_connection(b_rd, b_wr).await })
    };
    let ping = message(&(0, 9, "ping", ()));
    b_client_wr.write_all(&encode_frame(&ping).unwrap()).await.unwrap();
    b_client_wr.shutdown().await.unwrap();

    let replies = tokio::time::timeout(Duration::from_secs(2), read_replies(b_client_rd))
        .await
        .expect("ping on B should be admitted");
    conn_b.await.unwrap().unwrap();

    assert_eq!(
        replies,
        vec![Value::Array(vec![
            Value::from(1),
            Value::from(9),
            Value::Nil,
            Value::from("pong"),
        ])]
    );
}
