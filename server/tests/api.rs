//! HTTP 経由の結合テスト（上流モデルは ScriptedModel、DB はインメモリ）

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use app_lib::{create_app, USER_ID_HEADER};
use styleable_core::domain::settings::AppSettings;
use styleable_core::infra::llm::ScriptedModel;
use styleable_core::infra::payment::MockPaymentGateway;
use styleable_core::infra::storage::Storage;
use styleable_core::usecase::app_service::AppService;

const PROFILE: &str = r#"```json
{
  "style_summary": "冷静克制的散文",
  "language": {"sentence_pattern": ["短句"], "word_choice": {"formality_level": 3}, "rhetoric": []},
  "structure": {"paragraph_length": "中"},
  "narrative": {"perspective": "第一人称"},
  "emotion": {"intensity": 2},
  "thinking": {"logic_pattern": "联想"},
  "uniqueness": {"signature_phrases": []},
  "cultural": {"allusions": []},
  "rhythm": {"tempo": "慢"}
}
```"#;

struct Harness {
    app: Router,
    service: Arc<AppService>,
    model: Arc<ScriptedModel>,
}

fn harness() -> Harness {
    let model = Arc::new(ScriptedModel::new());
    let settings = AppSettings {
        paywall_preview_chars: 4,
        payment_delay_ms: 0,
        ..AppSettings::default()
    };
    let service = Arc::new(AppService::new(
        Arc::new(Storage::open_in_memory().unwrap()),
        model.clone(),
        Arc::new(MockPaymentGateway::new(Duration::ZERO)),
        settings,
    ));
    Harness {
        app: create_app(service.clone()),
        service,
        model,
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn start(h: &Harness, user: Option<&str>) -> String {
    let (status, body) = send(&h.app, Method::POST, "/api/wizards", user, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["step"], "analyze_style");
    body["wizard_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let (status, body) = send(&h.app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "scripted");
}

#[tokio::test]
async fn test_full_flow_with_paywall_and_saved_work() {
    let h = harness();
    h.model
        .push_text(PROFILE)
        .push_text("木屑落在年轮上。")
        .push_text("嗯……腰有点酸，木屑还在落。");

    let id = start(&h, Some("u1")).await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/analyze"),
        Some("u1"),
        Some(json!({"text": "春风拂面，柳絮纷飞。"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transition"]["new_step"], "enter_topic");
    assert_eq!(body["wizard"]["style_profile"]["style_summary"], "冷静克制的散文");

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/generate"),
        Some("u1"),
        Some(json!({"keywords": "古镇木工坊，年轮纹路"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wizard"]["step"], "generate_mimic");
    assert_eq!(body["wizard"]["title"], "古镇木工坊");
    assert_eq!(body["wizard"]["mimic_text"], "木屑落在年轮上。");

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/humanize"),
        Some("u1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wizard"]["step"], "final");
    assert_eq!(body["wizard"]["has_humanized_text"], true);
    assert!(body["wizard"].get("humanized_text").is_none());
    let job_id = body["job_id"].as_str().unwrap().to_string();

    // 未解錠ならプレビューのみ
    let (status, body) = send(
        &h.app,
        Method::GET,
        &format!("/api/wizards/{id}/content"),
        Some("u1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unlocked"], false);
    assert_eq!(body["truncated"], true);
    assert_eq!(body["text"], "嗯……腰...");

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/unlock"),
        Some("u1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["unlocked"], true);
    assert_eq!(body["content"]["text"], "嗯……腰有点酸，木屑还在落。");

    // 二重決済は不可
    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/unlock"),
        Some("u1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E_INVALID_STATE");

    let job = h.service.wait_job(&job_id).await.unwrap();
    let work_id = job.result_id.unwrap();

    let (status, body) = send(&h.app, Method::GET, "/api/works", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], work_id.as_str());
    assert_eq!(body[0]["title"], "古镇木工坊");

    let (status, body) = send(
        &h.app,
        Method::GET,
        &format!("/api/jobs/{job_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "done");

    let (_, metrics) = send(&h.app, Method::GET, "/api/metrics", None, None).await;
    assert_eq!(metrics["styles_analyzed"], 1);
    assert_eq!(metrics["texts_humanized"], 1);
    assert_eq!(metrics["unlocks"], 1);
}

#[tokio::test]
async fn test_empty_sample_is_bad_request_without_upstream_call() {
    let h = harness();
    let id = start(&h, None).await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/analyze"),
        None,
        Some(json!({"text": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E_VALIDATION");
    assert_eq!(h.model.call_count(), 0);
}

#[tokio::test]
async fn test_generate_out_of_order_is_conflict() {
    let h = harness();
    let id = start(&h, None).await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/generate"),
        None,
        Some(json!({"keywords": "k"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E_INVALID_STATE");
}

#[tokio::test]
async fn test_upstream_failures_map_to_bad_gateway() {
    let h = harness();
    h.model.push_text("抱歉，我无法分析。");
    let id = start(&h, None).await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/analyze"),
        None,
        Some(json!({"text": "样本"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "E_EXTRACTION");
    assert_eq!(body["recoverable"], true);

    // 失敗後も同じ段階に留まる
    let (_, snapshot) = send(&h.app, Method::GET, &format!("/api/wizards/{id}"), None, None).await;
    assert_eq!(snapshot["step"], "analyze_style");
    assert!(snapshot["busy"].is_null());
}

#[tokio::test]
async fn test_unknown_wizard_is_not_found() {
    let h = harness();
    let (status, body) = send(&h.app, Method::GET, "/api/wizards/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E_NOT_FOUND");
}

#[tokio::test]
async fn test_wizard_is_hidden_from_other_users() {
    let h = harness();
    h.model.push_text(PROFILE);
    let id = start(&h, Some("u1")).await;
    let uri = format!("/api/wizards/{id}");

    for user in [Some("u2"), None] {
        let (status, body) = send(&h.app, Method::GET, &uri, user, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "E_NOT_FOUND");
    }

    // 他人の操作は上流に届かない
    let (status, _) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/analyze"),
        Some("u2"),
        Some(json!({"text": "样本"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(h.model.call_count(), 0);

    let (status, _) = send(&h.app, Method::DELETE, &uri, Some("u2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&h.app, Method::GET, &uri, Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "analyze_style");
}

#[tokio::test]
async fn test_discard_wizard() {
    let h = harness();
    let id = start(&h, None).await;
    let uri = format!("/api/wizards/{id}");

    let (status, _) = send(&h.app, Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&h.app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_styles_require_login_and_are_scoped() {
    let h = harness();
    h.model.push_text(PROFILE);

    let (status, _) = send(&h.app, Method::GET, "/api/styles", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = start(&h, Some("u1")).await;
    send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/analyze"),
        Some("u1"),
        Some(json!({"text": "样本"})),
    )
    .await;

    let (status, style) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/styles"),
        Some("u1"),
        Some(json!({"style_name": "木工散文"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(style["style_name"], "木工散文");
    let style_id = style["id"].as_str().unwrap().to_string();

    let (_, mine) = send(&h.app, Method::GET, "/api/styles", Some("u1"), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (_, theirs) = send(&h.app, Method::GET, "/api/styles", Some("u2"), None).await;
    assert!(theirs.as_array().unwrap().is_empty());

    // 保存済み文体で新しいウィザードを始める
    let id2 = start(&h, Some("u1")).await;
    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id2}/styles/select"),
        Some("u1"),
        Some(json!({"style_id": style_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wizard"]["step"], "enter_topic");
    assert_eq!(body["wizard"]["style_id"], style_id.as_str());
    assert_eq!(h.model.call_count(), 1);

    let uri = format!("/api/styles/{style_id}");
    let (status, _) = send(&h.app, Method::DELETE, &uri, Some("u2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&h.app, Method::DELETE, &uri, Some("u1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_favorites() {
    let h = harness();
    h.model
        .push_text(PROFILE)
        .push_text("仿写")
        .push_text("改写");

    let id = start(&h, Some("u1")).await;
    let mut job_id = None;
    for (path, body) in [
        ("analyze", Some(json!({"text": "样本"}))),
        ("generate", Some(json!({"keywords": "雨巷"}))),
        ("humanize", None),
    ] {
        let (status, outcome) = send(
            &h.app,
            Method::POST,
            &format!("/api/wizards/{id}/{path}"),
            Some("u1"),
            body,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{path}");
        job_id = outcome["job_id"].as_str().map(str::to_string);
    }

    let job = h.service.wait_job(&job_id.unwrap()).await.unwrap();
    let work_id = job.result_id.unwrap();

    let (status, work) = send(
        &h.app,
        Method::PUT,
        &format!("/api/works/{work_id}/favorite"),
        Some("u1"),
        Some(json!({"favorite": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(work["favorite"], true);

    let (_, work) = send(
        &h.app,
        Method::POST,
        &format!("/api/works/{work_id}/favorite/toggle"),
        Some("u1"),
        None,
    )
    .await;
    assert_eq!(work["favorite"], false);

    let (status, work) = send(
        &h.app,
        Method::GET,
        &format!("/api/works/{work_id}"),
        Some("u1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(work["humanized_text"], "改写");

    let (status, _) = send(
        &h.app,
        Method::GET,
        &format!("/api/works/{work_id}"),
        Some("u2"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_back_clears_generated_text() {
    let h = harness();
    h.model.push_text(PROFILE).push_text("仿写正文");
    let id = start(&h, None).await;
    send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/analyze"),
        None,
        Some(json!({"text": "样本"})),
    )
    .await;
    send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/generate"),
        None,
        Some(json!({"keywords": "k"})),
    )
    .await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/wizards/{id}/back"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wizard"]["step"], "enter_topic");
    assert!(body["wizard"]["mimic_text"].is_null());
}

#[tokio::test]
async fn test_detect() {
    let h = harness();
    h.model.push_text(
        r#"分析结果：{"verdict": {"ai_probability": 0.97}, "segment_analysis": [{"offset": 0, "content_snippet": "待检测", "anomaly_score": 0.9}]}"#,
    );

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/detect",
        None,
        Some(json!({"text": "待检测文本"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verdict"]["ai_probability"], 0.97);
    assert_eq!(body["verdict"]["confidence_band"], "A+");
    assert_eq!(body["segment_analysis"][0]["offset"], "0");
}

#[tokio::test]
async fn test_detect_without_verdict_is_extraction_error() {
    let h = harness();
    h.model.push_text(r#"{"segment_analysis": []}"#);

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/detect",
        None,
        Some(json!({"text": "待检测文本"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "E_EXTRACTION");
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let h = harness();
    let (status, _) = send(&h.app, Method::GET, "/api/jobs/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
