//! HTTP backend client tests against a mock server.

use mockito::Server;
use truechart::api::{
    ApiError, ChartKind, ChatRequest, ConfirmTrueChartRequest, HttpBackend, OcrOutcome,
    PreviewOutcome, PreviewRequest, VerifyBackend,
};

fn preview_request(text: &str, kind: ChartKind) -> PreviewRequest {
    let mut request = PreviewRequest::new(text, kind);
    request.user_id = Some("42".to_string());
    request.group_index = Some(0);
    request
}

#[tokio::test]
async fn preview_decodes_single_shape() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/verify/api/preview")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "ok": true,
                "score": 0.82,
                "parsed": {"name": "张三", "gender": "男", "birth_time": "1990-01-01 子时"},
                "toast": "识别成功！匹配评分：0.82"
            }"#,
        )
        .create_async()
        .await;

    let backend = HttpBackend::new(server.url()).expect("client builds");
    let outcome = backend
        .preview(preview_request("甲子年生", ChartKind::Bazi))
        .await
        .expect("preview succeeds");

    match outcome {
        PreviewOutcome::Single { result, .. } => {
            assert_eq!(result.score, Some(0.82));
            assert_eq!(
                result.parsed.and_then(|p| p.name),
                Some("张三".to_string())
            );
        }
        other => panic!("expected single outcome, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn preview_dual_shape_round_trips() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/verify/api/preview")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "ok": true,
                "auto_verified": true,
                "parsed": {"name": "张三"},
                "bazi_verification": {
                    "birth_time_confidence": "高",
                    "key_supporting_evidence": ["早年离家"],
                    "key_conflicts": [],
                    "summary": "八字与事件吻合"
                },
                "ziwei_verification": {
                    "birth_time_confidence": 0.5,
                    "summary": "紫微部分吻合"
                }
            }"#,
        )
        .create_async()
        .await;

    let backend = HttpBackend::new(server.url()).expect("client builds");
    let outcome = backend
        .preview(preview_request("甲子年生", ChartKind::Bazi))
        .await
        .expect("preview succeeds");

    match outcome {
        PreviewOutcome::Dual { bazi, ziwei, .. } => {
            assert_eq!(bazi.confidence.display(), "高");
            assert_eq!(bazi.supporting_evidence, vec!["早年离家"]);
            assert_eq!(ziwei.level().label(), "中");
        }
        other => panic!("expected dual outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn rejection_body_wins_over_status_code() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/verify/api/preview")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": false, "toast": "请先输入或上传命盘文本"}"#)
        .create_async()
        .await;

    let backend = HttpBackend::new(server.url()).expect("client builds");
    let err = backend
        .preview(preview_request(" ", ChartKind::Bazi))
        .await
        .expect_err("rejected");

    match err {
        ApiError::Rejected(reason) => assert_eq!(reason, "请先输入或上传命盘文本"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_error_body_reports_status() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/verify/api/preview")
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let backend = HttpBackend::new(server.url()).expect("client builds");
    let err = backend
        .preview(preview_request("甲子年生", ChartKind::Bazi))
        .await
        .expect_err("bad gateway");

    match err {
        ApiError::Status { status } => assert_eq!(status, 502),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_round_trip_decodes_reply() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/verify/api/chat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "ok": true,
                "message": "我们先从家庭背景开始吧。",
                "ai_name": "灵伴",
                "verification_triggered": false
            }"#,
        )
        .create_async()
        .await;

    let backend = HttpBackend::new(server.url()).expect("client builds");
    let reply = backend
        .chat(ChatRequest {
            user_id: "42".to_string(),
            message: "你好".to_string(),
            history: vec![],
            chart_uploaded: false,
            group_index: 0,
            life_events: String::new(),
            parsed_chart: serde_json::json!({}),
            chart_locked: Some(false),
        })
        .await
        .expect("chat succeeds");

    assert_eq!(reply.message, "我们先从家庭背景开始吧。");
    assert_eq!(reply.ai_name.as_deref(), Some("灵伴"));
    assert!(reply.verification.is_none());
}

#[tokio::test]
async fn ocr_posts_multipart_and_decodes() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/verify/api/ocr")
        .match_header(
            "content-type",
            mockito::Matcher::Regex("multipart/form-data.*".to_string()),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true, "raw_text": "甲子年 丙寅月"}"#)
        .create_async()
        .await;

    let backend = HttpBackend::new(server.url()).expect("client builds");
    let outcome = backend
        .ocr(
            "chart.png".to_string(),
            "image/png".to_string(),
            vec![0x89, 0x50, 0x4e, 0x47],
        )
        .await
        .expect("ocr succeeds");

    assert_eq!(
        outcome,
        OcrOutcome::Recognized {
            text: "甲子年 丙寅月".to_string()
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn confirm_true_chart_acknowledges() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/verify/api/confirm_true_chart")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"ok": true, "chart_locked": true, "toast": "真命盘已确认，现在可以开始验证断语"}"#,
        )
        .create_async()
        .await;

    let backend = HttpBackend::new(server.url()).expect("client builds");
    let ack = backend
        .confirm_true_chart(ConfirmTrueChartRequest {
            user_id: "42".to_string(),
            chart_id: Some(7),
        })
        .await
        .expect("confirm succeeds");

    assert!(ack.toast.is_some_and(|t| t.contains("真命盘已确认")));
}

#[tokio::test]
async fn transport_error_is_not_a_rejection() {
    // Nothing listens on this port
    let backend =
        HttpBackend::new("http://127.0.0.1:1").expect("client builds");
    let err = backend
        .preview(preview_request("甲子年生", ChartKind::Bazi))
        .await
        .expect_err("connection refused");
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(!err.is_rejection());
}
