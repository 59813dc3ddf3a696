mod support;

use std::time::Duration;

use axum::http::StatusCode;
use chrono::NaiveDate;
use serde_json::json;
use support::{job_json, silent_host, spawn_server, unreachable_host, MockResponse};
use waconn::{ApiRequest, ClientOptions, ConnectionConfig, WaConn, WaError};

fn conn(hosts: Vec<String>) -> WaConn {
    WaConn::new(ConnectionConfig::new(hosts, "wauser", "s3cret"), "/twsd").expect("must build client")
}

#[tokio::test]
async fn fails_over_to_first_reachable_host() {
    let live = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::json(StatusCode::OK, json!({ "ok": true })),
    )])
    .await;
    let spare = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::json(StatusCode::OK, json!({ "ok": "spare" })),
    )])
    .await;
    let hosts = vec![
        unreachable_host(),
        unreachable_host(),
        live.base_url.clone(),
        spare.base_url.clone(),
    ];
    let conn = conn(hosts);

    let response = conn.get("/ping", &[]).await.expect("must reach live host");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(live.hits(), 1);
    assert_eq!(spare.hits(), 0);
    assert_eq!(conn.current_host(), Some(live.base_url.as_str()));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn connect_timeout_fails_over_to_next_host() {
    let silent = silent_host().await;
    let live = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::json(StatusCode::OK, json!({ "ok": true })),
    )])
    .await;
    let conn = conn(vec![silent.base_url.clone(), live.base_url.clone()])
        .with_options(ClientOptions {
            connect_timeout_ms: 100,
            timeout_ms: 5_000,
            ..ClientOptions::default()
        })
        .expect("must rebuild client");

    let response = conn.get("/ping", &[]).await.expect("must fail over after connect timeout");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(live.hits(), 1);
    assert_eq!(conn.current_host(), Some(live.base_url.as_str()));
}

#[tokio::test]
async fn gives_up_after_one_attempt_per_host() {
    let conn = conn(vec![unreachable_host(), unreachable_host(), unreachable_host()]);

    let err = conn.get("/ping", &[]).await.expect_err("no host can answer");

    match err {
        WaError::NoHostReachable { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(source.is_connect());
        }
        other => panic!("expected NoHostReachable, got {other:?}"),
    }
}

#[tokio::test]
async fn exhausted_hosts_leave_cursor_where_it_started() {
    let hosts = vec![unreachable_host(), unreachable_host()];
    let first = hosts[0].clone();
    let conn = conn(hosts);

    conn.get("/ping", &[]).await.expect_err("no host can answer");

    assert_eq!(conn.current_host(), Some(first.as_str()));
}

#[tokio::test]
async fn remembers_preferred_host_between_calls() {
    let b = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::json(StatusCode::OK, json!({ "ok": true })),
    )])
    .await;
    let a = unreachable_host();
    let conn = conn(vec![a, b.base_url.clone()]);

    let response = conn.get("/ping", &[]).await.expect("b must answer");
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("must be JSON");
    assert_eq!(body, json!({ "ok": true }));
    assert_eq!(conn.current_host(), Some(b.base_url.as_str()));

    conn.get("/ping", &[]).await.expect("b must answer again");
    assert_eq!(b.hits(), 2);
    assert_eq!(conn.current_host(), Some(b.base_url.as_str()));
}

#[tokio::test]
async fn clones_share_the_cursor() {
    let b = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::json(StatusCode::OK, json!({})),
    )])
    .await;
    let conn = conn(vec![unreachable_host(), b.base_url.clone()]);
    let clone = conn.clone();

    conn.get("/ping", &[]).await.expect("b must answer");

    assert_eq!(clone.current_host(), Some(b.base_url.as_str()));
}

#[tokio::test]
async fn applies_default_headers_and_basic_auth() {
    let server = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::json(StatusCode::OK, json!({})),
    )])
    .await;
    let conn = conn(vec![server.base_url.clone()]);

    conn.get("/ping", &[]).await.expect("must succeed");

    let req = server.last_request();
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("accept"), Some("application/json"));
    assert_eq!(req.header("how-many"), Some("500"));
    assert_eq!(req.header("request-id"), Some(conn.request_id()));
    assert!(!conn.request_id().is_empty());
    // base64("wauser:s3cret")
    assert_eq!(req.header("authorization"), Some("Basic d2F1c2VyOnMzY3JldA=="));
}

#[tokio::test]
async fn request_id_is_stable_across_calls() {
    let server = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::json(StatusCode::OK, json!({})),
    )])
    .await;
    let conn = conn(vec![server.base_url.clone()]);

    conn.get("/ping", &[]).await.expect("must succeed");
    conn.get("/ping", &[]).await.expect("must succeed");

    let ids: Vec<String> = server
        .requests()
        .iter()
        .map(|req| req.header("request-id").unwrap_or_default().to_owned())
        .collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], ids[1]);
}

#[tokio::test]
async fn caller_headers_are_not_overwritten() {
    let server = spawn_server(vec![(
        "POST /twsd/plan/current/job/query",
        MockResponse::json(StatusCode::OK, json!([])),
    )])
    .await;
    let conn = conn(vec![server.base_url.clone()]);

    let req = ApiRequest::post("/plan/current/job/query")
        .json(&json!({ "filters": {} }))
        .expect("must serialize")
        .header("How-Many", "10")
        .expect("valid header")
        .header("Request-Id", "caller-id")
        .expect("valid header");
    conn.request(req).await.expect("must succeed");

    let recorded = server.last_request();
    assert_eq!(recorded.header("how-many"), Some("10"));
    assert_eq!(recorded.header("request-id"), Some("caller-id"));
    assert_eq!(recorded.header("accept"), Some("application/json"));
}

#[tokio::test]
async fn how_many_default_follows_options() {
    let server = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::json(StatusCode::OK, json!({})),
    )])
    .await;
    let conn = conn(vec![server.base_url.clone()])
        .with_options(ClientOptions {
            how_many: 50,
            ..ClientOptions::default()
        })
        .expect("must rebuild client");

    conn.get("/ping", &[]).await.expect("must succeed");

    assert_eq!(server.last_request().header("how-many"), Some("50"));
}

#[tokio::test]
async fn http_error_surfaces_server_messages_without_retry() {
    let failing = spawn_server(vec![(
        "POST /twsd/plan/current/job/query",
        MockResponse::json(
            StatusCode::BAD_REQUEST,
            json!({ "messages": ["E001: bad filter"] }),
        ),
    )])
    .await;
    let other = spawn_server(vec![]).await;
    let conn = conn(vec![failing.base_url.clone(), other.base_url.clone()]);

    let err = conn
        .post("/plan/current/job/query", &json!({ "filters": {} }))
        .await
        .expect_err("400 must be an error");

    match &err {
        WaError::Http {
            status, messages, ..
        } => {
            assert_eq!(*status, 400);
            assert_eq!(messages, &vec!["E001: bad filter".to_owned()]);
        }
        other => panic!("expected http error, got {other:?}"),
    }
    assert_eq!(err.server_messages(), ["E001: bad filter".to_owned()]);
    assert_eq!(failing.hits(), 1);
    assert_eq!(other.hits(), 0);
    assert_eq!(conn.current_host(), Some(failing.base_url.as_str()));
}

#[tokio::test]
async fn http_error_with_non_json_body_is_still_an_error() {
    let server = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::text(StatusCode::BAD_GATEWAY, "<html>upstream down</html>"),
    )])
    .await;
    let conn = conn(vec![server.base_url.clone()]);

    let err = conn.get("/ping", &[]).await.expect_err("502 must be an error");

    match err {
        WaError::Http {
            status,
            body,
            messages,
        } => {
            assert_eq!(status, 502);
            assert!(body.contains("upstream down"));
            assert!(messages.is_empty());
        }
        other => panic!("expected http error, got {other:?}"),
    }
}

#[tokio::test]
async fn read_timeout_is_not_retried_on_next_host() {
    let slow = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::json(StatusCode::OK, json!({})).with_delay(Duration::from_millis(300)),
    )])
    .await;
    let spare = spawn_server(vec![(
        "GET /twsd/ping",
        MockResponse::json(StatusCode::OK, json!({})),
    )])
    .await;
    let conn = conn(vec![slow.base_url.clone(), spare.base_url.clone()])
        .with_options(ClientOptions {
            timeout_ms: 30,
            ..ClientOptions::default()
        })
        .expect("must rebuild client");

    let err = conn.get("/ping", &[]).await.expect_err("must time out");

    match err {
        WaError::Transport(inner) => assert!(inner.is_timeout()),
        other => panic!("expected transport timeout, got {other:?}"),
    }
    assert_eq!(spare.hits(), 0);
}

#[tokio::test]
async fn empty_host_list_is_rejected() {
    let conn = conn(Vec::new());
    let err = conn.get("/ping", &[]).await.expect_err("must fail");
    assert!(matches!(err, WaError::NoHosts));
    assert_eq!(conn.current_host(), None);
}

#[tokio::test]
async fn query_jobs_in_plan_posts_filter() {
    let server = spawn_server(vec![(
        "POST /twsd/plan/current/job/query",
        MockResponse::json(
            StatusCode::OK,
            json!([
                job_json("CPU1", "DAILY", "BACKUP", "2024-05-01T06:30:00.000Z"),
                { "name": "incomplete" }
            ]),
        ),
    )])
    .await;
    let conn = conn(vec![server.base_url.clone()]);

    let jobs = conn
        .query_jobs_in_plan("BACKUP@")
        .await
        .expect("query must succeed");

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].workstation, "CPU1");
    assert_eq!(jobs[0].job_stream, "DAILY");
    assert_eq!(jobs[0].name, "BACKUP");
    assert_eq!(
        server.last_request().json(),
        json!({ "filters": { "jobInPlanFilter": { "jobName": "BACKUP@" } } })
    );
}

#[tokio::test]
async fn jobstream_lookup_and_rc_evaluation() {
    let server = spawn_server(vec![
        (
            "GET /twsd/model/jobstream",
            MockResponse::json(StatusCode::OK, json!({ "header": { "id": "js-1" } })),
        ),
        (
            "GET /twsd/model/jobstream/js-1/rc-evaluation",
            MockResponse::json(
                StatusCode::OK,
                json!({ "results": [
                    { "date": "2024-05-01", "type": ["SELECTED"] },
                    { "date": "2024-05-02", "type": ["EXCLUDED"] }
                ] }),
            ),
        ),
    ])
    .await;
    let conn = conn(vec![server.base_url.clone()]);

    let streams = conn.find_jobstreams("DAILY").await.expect("lookup must succeed");
    assert_eq!(streams.len(), 1);
    assert_eq!(server.last_request().query.as_deref(), Some("key=DAILY"));

    let from = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
    let to = NaiveDate::from_ymd_opt(2024, 5, 31).expect("valid date");
    let eval = conn
        .rc_evaluation(&streams[0].id, from, to)
        .await
        .expect("evaluation must succeed");

    assert_eq!(eval.selected_dates(), vec!["2024-05-01"]);
    assert_eq!(
        server.last_request().query.as_deref(),
        Some("from=2024-05-01&to=2024-05-31")
    );
}
