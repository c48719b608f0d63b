//! Credential gateway tests against a mocked platform

use wechat_miniprogram::api::security::MsgSecCheckOptions;
use wechat_miniprogram::crypto::session_signature;
use wechat_miniprogram::types::{AppId, AppSecret};
use wechat_miniprogram::{ApiError, ClientConfig, Miniprogram, WechatError};
use wiremock::matchers::{any, body_json, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches the raw query string exactly, parameter order included.
struct ExactQuery(&'static str);

impl Match for ExactQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query() == Some(self.0)
    }
}

fn create_test_miniprogram(mock_server: &MockServer) -> Miniprogram {
    Miniprogram::builder()
        .config(ClientConfig::new(
            AppId::new("wx123").unwrap(),
            AppSecret::new("secret").unwrap(),
        ))
        .base_url(mock_server.uri())
        .build()
        .unwrap()
}

async fn mount_stable_token(mock_server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/cgi-bin/stable_token"))
        .and(body_json(serde_json::json!({
            "grant_type": "client_credential",
            "appid": "wx123",
            "secret": "secret",
            "force_refresh": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "expires_in": 7200
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_access_token_query_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .and(ExactQuery("grant_type=client_credential&appid=wx123&secret=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ACCESS",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let response = mp.get_access_token().await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.access_token, "ACCESS");
    assert_eq!(response.expires_in, 7200);
}

#[tokio::test]
async fn test_access_token_business_error_is_returned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 40013,
            "errmsg": "invalid appid"
        })))
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let response = mp.get_access_token().await.unwrap();

    assert!(!response.is_success());
    assert_eq!(response.errcode(), 40013);
    assert_eq!(response.errmsg(), "invalid appid");
    assert!(response.access_token.is_empty());
}

#[tokio::test]
async fn test_stable_access_token_force_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/stable_token"))
        .and(body_json(serde_json::json!({
            "grant_type": "client_credential",
            "appid": "wx123",
            "secret": "secret",
            "force_refresh": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "STABLE",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let response = mp.get_stable_access_token(true).await.unwrap();

    assert_eq!(response.access_token, "STABLE");
}

#[tokio::test]
async fn test_code2session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sns/jscode2session"))
        .and(ExactQuery(
            "appid=wx123&secret=secret&js_code=081abc&grant_type=authorization_code",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "openid": "oABC",
            "session_key": "c2Vzc2lvbl9rZXk=",
            "unionid": "uXYZ"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let session = mp.code2session("081abc").await.unwrap();

    assert!(session.is_success());
    assert_eq!(session.openid, "oABC");
    assert_eq!(session.session_key, "c2Vzc2lvbl9rZXk=");
    assert_eq!(session.unionid.as_deref(), Some("uXYZ"));
}

#[tokio::test]
async fn test_code2session_empty_code_makes_no_call() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let err = mp.code2session("").await.unwrap_err();

    assert!(matches!(err, WechatError::InvalidParams(_)));
    assert_eq!(err.code(), 400);
}

#[tokio::test]
async fn test_check_session_key_uses_fresh_token() {
    let mock_server = MockServer::start().await;
    mount_stable_token(&mock_server, "TOKEN").await;

    Mock::given(method("GET"))
        .and(path("/wxa/checksession"))
        .and(query_param("access_token", "TOKEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let response = mp.check_session_key().await.unwrap();

    assert!(response.is_success());
}

#[tokio::test]
async fn test_check_user_session_key_is_signed() {
    let mock_server = MockServer::start().await;
    mount_stable_token(&mock_server, "TOKEN").await;

    let signature = session_signature("session_key").unwrap();
    Mock::given(method("GET"))
        .and(path("/wxa/checksession"))
        .and(query_param("access_token", "TOKEN"))
        .and(query_param("openid", "oABC"))
        .and(query_param("signature", signature.as_str()))
        .and(query_param("sig_method", "hmac_sha256"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 87009,
            "errmsg": "invalid signature"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let response = mp
        .check_user_session_key("oABC", "session_key")
        .await
        .unwrap();

    assert_eq!(response.errcode(), 87009);
}

#[tokio::test]
async fn test_get_phone_number() {
    let mock_server = MockServer::start().await;
    mount_stable_token(&mock_server, "TOKEN").await;

    Mock::given(method("POST"))
        .and(path("/wxa/business/getuserphonenumber"))
        .and(query_param("access_token", "TOKEN"))
        .and(body_json(serde_json::json!({"code": "007", "openid": "oABC"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "phone_info": {
                "phoneNumber": "+8613800138000",
                "purePhoneNumber": "13800138000",
                "countryCode": "86",
                "watermark": {"timestamp": 1637744274, "appid": "wx123"}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let response = mp.get_phone_number("007", "oABC").await.unwrap();

    let info = response.phone_info.unwrap();
    assert_eq!(info.phone_number, "+8613800138000");
    assert_eq!(info.pure_phone_number, "13800138000");
    assert_eq!(info.country_code, "86");
    assert!(info.watermark.is_for("wx123"));
}

#[tokio::test]
async fn test_get_phone_number_empty_code_makes_no_call() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let err = mp.get_phone_number("", "oABC").await.unwrap_err();

    assert!(matches!(err, WechatError::InvalidParams(_)));
}

#[tokio::test]
async fn test_failed_token_request_sends_empty_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/stable_token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wxa/business/getuserphonenumber"))
        .and(query_param("access_token", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 41001,
            "errmsg": "access_token missing"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let response = mp.get_phone_number("007", "").await.unwrap();

    assert!(response.phone_info.is_none());
    assert_eq!(response.errcode(), 41001);
}

#[tokio::test]
async fn test_msg_sec_check_profile_scene_is_signed() {
    let mock_server = MockServer::start().await;
    mount_stable_token(&mock_server, "TOKEN").await;

    let signature = session_signature("session_key").unwrap();
    Mock::given(method("POST"))
        .and(path("/wxa/msg_sec_check"))
        .and(query_param("access_token", "TOKEN"))
        .and(body_json(serde_json::json!({
            "content": "hello world",
            "version": 2,
            "scene": 1,
            "openid": "oABC",
            "nickname": "nick",
            "signature": signature
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "trace_id": "trace",
            "result": {"suggest": "pass", "label": 100},
            "detail": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let options = MsgSecCheckOptions::default().title("").nickname("nick");
    let response = mp
        .msg_sec_check("hello world", 1, "oABC", "session_key", Some(options))
        .await
        .unwrap();

    assert!(response.is_pass());
    assert_eq!(response.trace_id, "trace");
}

#[tokio::test]
async fn test_msg_sec_check_other_scene_is_unsigned() {
    let mock_server = MockServer::start().await;
    mount_stable_token(&mock_server, "TOKEN").await;

    Mock::given(method("POST"))
        .and(path("/wxa/msg_sec_check"))
        .and(body_json(serde_json::json!({
            "content": "hello world",
            "version": 2,
            "scene": 2,
            "openid": "oABC"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "result": {"suggest": "risky", "label": 20001}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let response = mp
        .msg_sec_check("hello world", 2, "oABC", "session_key", None)
        .await
        .unwrap();

    assert!(response.is_success());
    assert!(!response.is_pass());
}

#[tokio::test]
async fn test_msg_sec_check_rejects_unknown_scene() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    for scene in [0u8, 5, 255] {
        let err = mp
            .msg_sec_check("hello", scene, "oABC", "session_key", None)
            .await
            .unwrap_err();
        assert!(matches!(err, WechatError::InvalidParams(_)), "scene {}", scene);
    }

    for (content, openid, session_key) in [("", "oABC", "sk"), ("hi", "", "sk"), ("hi", "oABC", "")] {
        let err = mp
            .msg_sec_check(content, 2, openid, session_key, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WechatError::InvalidParams(_)));
    }
}

#[tokio::test]
async fn test_server_errors_map_to_service_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);

    let results = vec![
        mp.get_access_token().await.map(|_| ()),
        mp.get_stable_access_token(false).await.map(|_| ()),
        mp.code2session("081abc").await.map(|_| ()),
        mp.check_session_key().await.map(|_| ()),
        mp.get_phone_number("007", "oABC").await.map(|_| ()),
        mp.msg_sec_check("hello", 3, "oABC", "sk", None)
            .await
            .map(|_| ()),
        mp.get_user_encrypt_key("oABC", "sk").await.map(|_| ()),
    ];

    for result in results {
        match result {
            Err(WechatError::ServiceUnavailable { status, message }) => {
                assert_eq!(status, Some(500));
                assert!(message.contains("upstream exploded"));
            }
            other => panic!("expected ServiceUnavailable, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_undecodable_body_maps_to_service_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sns/jscode2session"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&mock_server)
        .await;

    let mp = create_test_miniprogram(&mock_server);
    let err = mp.code2session("081abc").await.unwrap_err();

    assert!(matches!(
        err,
        WechatError::ServiceUnavailable { status: Some(200), .. }
    ));
}

#[tokio::test]
async fn test_unreachable_platform_maps_to_service_unavailable() {
    let mp = Miniprogram::builder()
        .config(ClientConfig::new(
            AppId::new("wx123").unwrap(),
            AppSecret::new("secret").unwrap(),
        ))
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();

    let err = mp.code2session("081abc").await.unwrap_err();
    let rendered = ApiError::from(&err);

    assert!(matches!(err, WechatError::ServiceUnavailable { status: None, .. }));
    assert_eq!(rendered.code, 503);
}
