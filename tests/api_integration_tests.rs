// API Integration Tests
//
// Purpose: Drive every endpoint through the router with an in-memory store
// Run with: cargo test --features api --test api_integration_tests

#[cfg(feature = "api")]
mod api_tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use moedict_rust::shard::{escape_headword, index_key, listing_key, shard_key, xref_key};
    use moedict_rust::{create_router, AppState, Lang, MemoryStorage, ServerConfig};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt; // for oneshot

    // Helper: Create test app over fixture data
    fn create_test_app() -> axum::Router {
        let storage = Arc::new(MemoryStorage::new());

        storage.insert_json(
            shard_key("萌", Lang::Mandarin).unwrap(),
            &json!({
                escape_headword("萌"): {
                    "t": "萌", "r": "艸", "c": 12, "n": 8,
                    "h": [{
                        "b": "ㄇㄥˊ", "p": "méng", "=": "0000",
                        "d": [{"f": "草木初生的芽。見`萌芽~。", "type": "名"}]
                    }],
                    "E": "to sprout"
                }
            }),
        );
        storage.insert_json(
            shard_key("食", Lang::Taiwanese).unwrap(),
            &json!({
                escape_headword("食"): {
                    "t": "食",
                    "h": [{"T": "tsia\u{030D}h", "_": 1, "d": [{"f": "吃。"}]}]
                }
            }),
        );
        storage.insert_json(xref_key(Lang::Mandarin), &json!({"t": {"萌": "萌"}}));
        storage.insert_json(listing_key(Lang::Mandarin, '=', "成語"), &json!(["一丁不識", "一刀兩斷"]));
        storage.insert_json(listing_key(Lang::Taiwanese, '=', "諺語"), &json!({"oops": true}));
        storage.insert_json(listing_key(Lang::Mandarin, '@', "艸"), &json!([["艸"], ["艾"]]));
        storage.insert_json(index_key(Lang::Hakka), &json!(["食", "𠊎"]));

        let config = ServerConfig {
            // Nothing listens here; stroke proxy requests fail fast.
            stroke_upstream: "http://127.0.0.1:9".to_string(),
            ..ServerConfig::default()
        };
        let state = AppState::with_storage(storage, &config).expect("state builds");
        create_router(state)
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, headers, json)
    }

    async fn get(uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(create_test_app(), request).await
    }

    fn encode(token: &str) -> String {
        urlencoding::encode(token).into_owned()
    }

    // =========================================================================
    // Section 1: Health Check
    // =========================================================================

    #[tokio::test]
    async fn test_health_check() {
        let (status, _, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    // =========================================================================
    // Section 2: Entries
    // =========================================================================

    #[tokio::test]
    async fn test_mandarin_entry() {
        let (status, _, body) = get(&format!("/api/{}.json", encode("萌"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "萌");
        assert_eq!(body["radical"], "艸");
        assert_eq!(body["English"], "to sprout");
        assert_eq!(body["heteronyms"][0]["bopomofo"], "ㄇㄥˊ");
        assert_eq!(body["heteronyms"][0]["audio_id"], "0000");
        assert_eq!(body["xrefs"], json!([{"lang": "t", "words": ["萌"]}]));

        let def = body["heteronyms"][0]["definitions"][0]["def"].as_str().unwrap();
        assert!(def.contains(r#"<a href="./#萌芽">萌芽</a>"#), "{}", def);
    }

    #[tokio::test]
    async fn test_taiwanese_entry_prefix_and_explicit_forms() {
        let (status, _, body) = get(&format!("/api/{}.json", encode("'食"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["heteronyms"][0]["trs"], "tsia\u{030D}h");
        assert_eq!(body["xrefs"], json!([]));

        let (status, _, explicit) = get(&format!("/api/t/{}.json", encode("食"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(explicit, body);
    }

    #[tokio::test]
    async fn test_missing_entry_returns_character_terms() {
        let (status, _, body) = get(&format!("/api/{}.json", encode("萌芽"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"terms": ["萌", "芽"]}));
    }

    #[tokio::test]
    async fn test_missing_entry_without_terms() {
        let (status, _, body) = get(&format!("/api/{}.json", encode("`~"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "找不到詞彙: `~");
        assert_eq!(body["terms"], json!([]));
    }

    // =========================================================================
    // Section 3: Listings
    // =========================================================================

    #[tokio::test]
    async fn test_category_listing() {
        let (status, headers, body) = get(&format!("/api/{}.json", encode("=成語"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["一丁不識", "一刀兩斷"]));
        assert_eq!(headers["cache-control"], "public, max-age=3600");

        let (status, _, body) = get(&format!("/api/{}.json", encode("=無此類"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "找不到分類：無此類");
    }

    #[tokio::test]
    async fn test_category_listing_must_be_array() {
        let (status, _, body) = get(&format!("/api/{}.json", encode("'=諺語"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_radical_listing() {
        let (status, _, body) = get(&format!("/api/{}.json", encode("@艸"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([["艸"], ["艾"]]));

        let (status, _, body) = get(&format!("/api/{}.json", encode("@水"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "找不到部首: @水");
    }

    #[tokio::test]
    async fn test_search_index() {
        let (status, _, body) = get("/api/index/h.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["食", "𠊎"]));

        let (status, _, _) = get("/api/index/a.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = get("/api/index/x.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bookmarks_token_is_not_served() {
        let (status, _, _) = get(&format!("/api/{}.json", encode("=*"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // =========================================================================
    // Section 4: Stroke proxy
    // =========================================================================

    #[tokio::test]
    async fn test_stroke_json_rejects_bad_codepoints() {
        let (status, _, body) = get("/api/stroke-json/840g.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad Request");
    }

    #[tokio::test]
    async fn test_stroke_json_unreachable_upstream() {
        let (status, _, body) = get("/api/stroke-json/840C.json").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Proxy Error");
    }

    // =========================================================================
    // Section 5: Rendering and preferences
    // =========================================================================

    #[tokio::test]
    async fn test_render_with_explicit_system() {
        let (status, _, body) = get(&format!("/render/{}?system=POJ", encode("'食"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["preference"], "POJ");
        assert_eq!(body["heteronyms"][0]["reading"], "chia\u{030D}h");
        assert_eq!(body["heteronyms"][0]["bopomofo"], "ㄐㄧㄚㆷ\u{0358}");
        assert!(body["heteronyms"][0]["ruby"].as_str().unwrap().starts_with("<hruby"));
    }

    #[tokio::test]
    async fn test_render_missing_headword() {
        let (status, _, body) = get(&format!("/render/{}", encode("萌芽"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["terms"], json!(["萌", "芽"]));
    }

    #[tokio::test]
    async fn test_preferences_round_trip() {
        let app = create_test_app();

        let (status, _, body) = send(
            app.clone(),
            Request::builder().uri("/preferences/t").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], "TL");

        let (status, _, body) = send(
            app.clone(),
            Request::builder()
                .method("PUT")
                .uri("/preferences/t")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"value":"TL-DT"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"lang": "t", "value": "TL-DT", "system": "DT", "parallel": true}));

        // Rendering picks up the stored choice.
        let (status, _, body) = send(
            app.clone(),
            Request::builder()
                .uri(format!("/render/{}", encode("'食")))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["preference"], "TL-DT");

        let (status, _, _) = send(
            app,
            Request::builder().uri("/preferences/x").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
