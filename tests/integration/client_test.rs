// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! BiliClient 集成测试
//!
//! 用 wiremock 模拟上游接口，验证签名流程、重试语义与错误分类。

use bilicrawl::config::settings::ApiSettings;
use bilicrawl::domain::source::{SourceError, VideoSource};
use bilicrawl::infrastructure::bili::BiliClient;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMG_URL: &str = "https://i0.hdslb.com/bfs/wbi/7cd084941338484aae1ad9425b84077c.png";
const SUB_URL: &str = "https://i0.hdslb.com/bfs/wbi/4932caff0ff746eab6f01bf08b70ac45.png";

fn settings(base_url: &str, max_retries: u32) -> ApiSettings {
    ApiSettings {
        base_url: base_url.to_string(),
        cookie: String::new(),
        timeout_secs: 5,
        user_agent: "bilicrawl-test/1.0".to_string(),
        max_retries,
    }
}

async fn mount_nav(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/x/web-interface/nav"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "wbi_img": { "img_url": IMG_URL, "sub_url": SUB_URL }
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_is_signed() {
    let server = MockServer::start().await;
    mount_nav(&server).await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/wbi/search/type"))
        .and(query_param("search_type", "video"))
        .and(query_param("keyword", "线性代数"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "result": [
                    { "bvid": "BV1xx411c7mD", "title": "线性代数精讲", "play": "1.2万" }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = BiliClient::new(&settings(&server.uri(), 0)).unwrap();
    assert!(client.signing_ready().await);

    let items = client.search("线性代数", 1, 20, "click").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].bvid, "BV1xx411c7mD");
    assert_eq!(items[0].play, 12_000);

    // 搜索请求必须携带签名参数
    let requests = server.received_requests().await.unwrap();
    let search_req = requests
        .iter()
        .find(|r| r.url.path() == "/x/web-interface/wbi/search/type")
        .unwrap();
    let query = search_req.url.query().unwrap_or_default();
    assert!(query.contains("w_rid="), "query = {query}");
    assert!(query.contains("wts="), "query = {query}");
}

#[tokio::test]
async fn test_search_without_keys_fails_as_signing_unavailable() {
    let server = MockServer::start().await;
    // nav 返回的密钥材料过短
    Mock::given(method("GET"))
        .and(path("/x/web-interface/nav"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "wbi_img": { "img_url": "https://x/a.png", "sub_url": "https://x/b.png" } }
        })))
        .mount(&server)
        .await;

    let client = BiliClient::new(&settings(&server.uri(), 0)).unwrap();
    assert!(!client.signing_ready().await);

    let err = client.search("极限", 1, 20, "click").await.unwrap_err();
    assert!(matches!(err, SourceError::SigningUnavailable));
}

#[tokio::test]
async fn test_retry_on_503_then_success() {
    let server = MockServer::start().await;

    // 首次 503 后放行，Retry-After 置零避免测试等待
    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(
            ResponseTemplate::new(503).insert_header("Retry-After", "0"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "bvid": "BV1xx",
                "title": "微分方程",
                "duration": 900,
                "stat": { "view": 1000, "like": 50 },
                "owner": { "mid": 42, "name": "某UP" }
            }
        })))
        .mount(&server)
        .await;

    let client = BiliClient::new(&settings(&server.uri(), 2)).unwrap();
    let detail = client.detail("BV1xx").await.unwrap();
    assert_eq!(detail.title, "微分方程");
    assert_eq!(detail.stat.view, 1000);
    assert_eq!(detail.owner.name, "某UP");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_rate_limit_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("Retry-After", "0"),
        )
        .mount(&server)
        .await;

    let client = BiliClient::new(&settings(&server.uri(), 1)).unwrap();
    let err = client.detail("BV1xx").await.unwrap_err();
    assert!(matches!(err, SourceError::RateLimited));

    // 初次请求 + 一次重试
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_api_error_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": -412,
            "message": "请求被拦截"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = BiliClient::new(&settings(&server.uri(), 3)).unwrap();
    let err = client.detail("BV1xx").await.unwrap_err();
    match err {
        SourceError::Api { code, message } => {
            assert_eq!(code, -412);
            assert_eq!(message, "请求被拦截");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // 业务错误只应产生一次请求
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_json_response_is_decode_error() {
    let server = MockServer::start().await;

    // 风控时上游直接返回 HTML
    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>risk control page</body></html>"),
        )
        .mount(&server)
        .await;

    let client = BiliClient::new(&settings(&server.uri(), 0)).unwrap();
    let err = client.detail("BV1xx").await.unwrap_err();
    match err {
        SourceError::Decode(message) => {
            assert!(message.contains("<html>"), "message = {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_tags_endpoint_extracts_names() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view/detail/tag"))
        .and(query_param("bvid", "BV1xx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": [
                { "tag_name": "考研" },
                { "tag_name": "  数学  " },
                { "tag_name": "" },
                { "other": "ignored" }
            ]
        })))
        .mount(&server)
        .await;

    let client = BiliClient::new(&settings(&server.uri(), 0)).unwrap();
    let tags = client.tags("BV1xx").await.unwrap();
    assert_eq!(tags, vec!["考研".to_string(), "数学".to_string()]);
}

#[tokio::test]
async fn test_empty_search_result_is_empty_vec() {
    let server = MockServer::start().await;
    mount_nav(&server).await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/wbi/search/type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {}
        })))
        .mount(&server)
        .await;

    let client = BiliClient::new(&settings(&server.uri(), 0)).unwrap();
    let items = client.search("不存在的关键词", 99, 20, "click").await.unwrap();
    assert!(items.is_empty());
}
