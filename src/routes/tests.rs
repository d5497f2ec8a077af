//! Tests for the conformance routes.

#[cfg(test)]
mod route_tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use crate::parser::{HttpRequest, HttpVersion, Method};
    use crate::routes::{conformance_routes, decode_with_label, encode_with_label};
    use crate::server::{Error, HttpResponse, HttpServer, ServerConfig, StatusCode};

    const REQUEST_TEXT: &str = "áéíóúñü";

    fn request(method: Method, target: &str, headers: &[(&str, &str)], body: &[u8]) -> HttpRequest {
        let headers = headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        HttpRequest::with_body(method, target, HttpVersion::Http11, headers, body.to_vec())
    }

    async fn call(method: Method, target: &str, headers: &[(&str, &str)], body: &[u8]) -> HttpResponse {
        let router = conformance_routes(&ServerConfig::default());
        router
            .dispatch(request(method, target, headers, body))
            .await
            .expect("route should answer")
    }

    async fn get(target: &str) -> HttpResponse {
        call(Method::GET, target, &[("Host", "localhost")], b"").await
    }

    fn body_text(response: &HttpResponse) -> &str {
        std::str::from_utf8(&response.body).unwrap()
    }

    #[tokio::test]
    async fn test_every_route_is_registered() {
        let router = conformance_routes(&ServerConfig::default());
        assert_eq!(router.len(), 22);

        for path in ["/request-latin-1", "/request-utf-8-default", "/request-utf-8-default-2",
            "/redirect-308", "/redirect-308-2", "/content-length", "/echo"]
        {
            assert!(router.lookup(Method::POST, path).is_some(), "{path} should accept POST");
            assert!(router.lookup(Method::GET, path).is_none(), "{path} should be POST only");
        }
        assert!(router.lookup(Method::POST, "/basic").is_none());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let router = conformance_routes(&ServerConfig::default());
        let result = router.dispatch(request(Method::GET, "/basic/", &[], b"")).await;
        assert!(matches!(result, Err(Error::NotFound(Method::GET, ref p)) if p == "/basic/"));

        let result = router.dispatch(request(Method::POST, "/basic", &[], b"")).await;
        assert!(matches!(result, Err(Error::NotFound(Method::POST, _))));
    }

    #[tokio::test]
    async fn test_basic() {
        let response = get("/basic").await;
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(body_text(&response), "Hello, World!");
        assert_eq!(response.get_header("Content-Type"), Some("text/plain; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_headers_test_casing() {
        let response = get("/headers-test").await;
        assert_eq!(body_text(&response), "HeadersTest");
        assert!(response.headers.contains(&("x-test-1".to_string(), "foo".to_string())));
        assert!(response.headers.contains(&("OTHER-TEST".to_string(), "bar".to_string())));
    }

    #[tokio::test]
    async fn test_basic_json() {
        let response = get("/basic-json").await;
        assert_eq!(response.get_header("Content-Type"), Some("application/json"));
        assert_eq!(body_text(&response), r#"{"foo":true,"hello":"world"}"#);

        let parsed: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(parsed, serde_json::json!({"foo": true, "hello": "world"}));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let response = get("/error-400").await;
        assert_eq!(response.status, StatusCode::BadRequest);
        assert!(response.body.is_empty());

        let response = get("/error-401").await;
        assert_eq!(response.status, StatusCode::Unauthorized);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_response_latin_1() {
        let response = get("/response-latin-1").await;
        assert_eq!(response.get_header("Content-Type"), Some("text/plain; charset=latin1"));
        assert_eq!(decode_with_label(&response.body, "latin1").as_deref(), Some("ñáéíóúß"));
        assert_ne!(String::from_utf8_lossy(&response.body), "ñáéíóúß");
    }

    #[tokio::test]
    async fn test_request_latin_1() {
        let latin1 = encode_with_label(REQUEST_TEXT, "latin1").unwrap();
        let headers = [("Host", "localhost"), ("Content-Type", "text/plain; charset=latin1")];

        let response = call(Method::POST, "/request-latin-1", &headers, &latin1).await;
        assert_eq!(body_text(&response), "OK");

        let response = call(Method::POST, "/request-latin-1", &headers, REQUEST_TEXT.as_bytes()).await;
        assert_eq!(body_text(&response), "FAIL");

        let response = call(Method::POST, "/request-latin-1", &[("Host", "localhost")], &latin1).await;
        assert_eq!(body_text(&response), "FAIL");

        let loose = [("Host", "localhost"), ("Content-Type", "text/plain;charset=latin1")];
        let response = call(Method::POST, "/request-latin-1", &loose, &latin1).await;
        assert_eq!(body_text(&response), "FAIL");
    }

    #[tokio::test]
    async fn test_request_utf_8_default() {
        let headers = [("Host", "localhost"), ("content-type", "text/plain; charset=utf-8")];
        let response = call(Method::POST, "/request-utf-8-default", &headers, REQUEST_TEXT.as_bytes()).await;
        assert_eq!(body_text(&response), "OK");

        let plain = [("Host", "localhost"), ("Content-Type", "text/plain")];
        let response = call(Method::POST, "/request-utf-8-default", &plain, REQUEST_TEXT.as_bytes()).await;
        assert_eq!(body_text(&response), "FAIL");

        let latin1 = encode_with_label(REQUEST_TEXT, "latin1").unwrap();
        let response = call(Method::POST, "/request-utf-8-default", &headers, &latin1).await;
        assert_eq!(body_text(&response), "FAIL");
    }

    #[tokio::test]
    async fn test_request_utf_8_default_2() {
        let response = call(Method::POST, "/request-utf-8-default-2", &[("Host", "localhost")], REQUEST_TEXT.as_bytes()).await;
        assert_eq!(body_text(&response), "OK");

        let response = call(Method::POST, "/request-utf-8-default-2", &[("Host", "localhost")], b"").await;
        assert_eq!(body_text(&response), "FAIL");
    }

    #[tokio::test]
    async fn test_response_utf_8_default() {
        let response = get("/response-utf-8-default").await;
        assert_eq!(response.get_header("Content-Type"), Some("text/plain"));
        assert_eq!(body_text(&response), "ñáéíóúß");
    }

    #[tokio::test]
    async fn test_response_big5() {
        let response = get("/response-big5").await;
        assert_eq!(response.get_header("Content-Type"), Some("text/plain; charset=big5"));
        assert_eq!(decode_with_label(&response.body, "big5").as_deref(), Some("常用字"));
    }

    #[tokio::test]
    async fn test_root_query() {
        assert_eq!(body_text(&get("/").await), "FAIL");
        assert_eq!(body_text(&get("/?foo=bar").await), "OK");
        assert_eq!(body_text(&get("/?foo=baz").await), "FAIL");
        assert_eq!(body_text(&get("/?foo=baz&foo=bar").await), "OK");
    }

    #[tokio::test]
    async fn test_redirects() {
        let response = get("/redirect-301").await;
        assert_eq!(response.status, StatusCode::MovedPermanently);
        assert_eq!(response.get_header("Location"), Some("/basic"));

        let response = get("/redirect-302").await;
        assert_eq!(response.status, StatusCode::Found);
        assert_eq!(response.get_header("Location"), Some("/basic"));

        let response = call(Method::POST, "/redirect-308", &[("Host", "localhost")], b"data").await;
        assert_eq!(response.status, StatusCode::PermanentRedirect);
        assert_eq!(response.get_header("Location"), Some("/redirect-308-2"));

        let response = call(Method::POST, "/redirect-308-2", &[("Host", "localhost")], b"data").await;
        assert_eq!(body_text(&response), "Redirect successful");
    }

    #[tokio::test]
    async fn test_no_user_agent() {
        assert_eq!(body_text(&get("/no-user-agent").await), "OK");

        let response = call(Method::GET, "/no-user-agent", &[("Host", "localhost"), ("user-agent", "x")], b"").await;
        assert_eq!(body_text(&response), "FAIL");
    }

    #[tokio::test]
    async fn test_content_length() {
        let response = call(Method::POST, "/content-length", &[("Host", "a"), ("Content-Length", "5")], b"hello").await;
        assert_eq!(body_text(&response), "OK");

        let response = call(Method::POST, "/content-length", &[("Host", "a"), ("Content-Length", "4")], b"hello").await;
        assert_eq!(body_text(&response), "FAIL");

        let response = call(Method::POST, "/content-length", &[("Host", "a")], b"hello").await;
        assert_eq!(body_text(&response), "FAIL");

        let response = call(Method::POST, "/content-length", &[("Host", "a"), ("Content-Length", "five")], b"hello").await;
        assert_eq!(body_text(&response), "FAIL");

        let response = call(Method::POST, "/content-length", &[("Host", "a"), ("Content-Length", "0")], b"").await;
        assert_eq!(body_text(&response), "OK");
    }

    #[tokio::test]
    async fn test_echo() {
        let text = "Grüße, 世界! 🎉";
        let response = call(Method::POST, "/echo", &[("Host", "a")], text.as_bytes()).await;
        assert_eq!(body_text(&response), text);

        let response = call(Method::POST, "/echo", &[("Host", "a")], b"").await;
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_zero_bytes_json() {
        let response = get("/zero-bytes-json").await;
        assert!(response.body.is_empty());
        assert_eq!(response.get_header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_sorted_headers() {
        let headers = [("Host", "localhost"), ("X-Zeta", "last"), ("Accept", "*/*"), ("x-alpha", "1")];
        let response = call(Method::GET, "/sorted-headers", &headers, b"").await;

        assert_eq!(response.get_header("Content-Type"), Some("text/plain"));
        assert_eq!(body_text(&response), "accept: */*\nhost: localhost\nx-alpha: 1\nx-zeta: last");
    }

    #[tokio::test]
    async fn test_image() {
        let config = ServerConfig::default();
        let expected = std::fs::read(config.static_dir.join("image.png")).unwrap();

        let response = get("/image.png").await;
        assert_eq!(response.get_header("Content-Type"), Some("image/png"));
        assert_eq!(response.body, expected);
        assert!(response.body.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[tokio::test]
    async fn test_image_last_modified() {
        let response = get("/image.png").await;
        let last_modified = response.get_header("Last-Modified").unwrap().to_string();
        assert!(last_modified.ends_with(" GMT"));

        let cached = [("Host", "localhost"), ("If-Modified-Since", last_modified.as_str())];
        let response = call(Method::GET, "/image.png", &cached, b"").await;
        assert_eq!(response.status, StatusCode::NotModified);
        assert!(response.body.is_empty());
        assert_eq!(response.get_header("Last-Modified"), Some(last_modified.as_str()));

        let stale = [("Host", "localhost"), ("If-Modified-Since", "Thu, 01 Jan 1970 00:00:00 GMT")];
        let response = call(Method::GET, "/image.png", &stale, b"").await;
        assert_eq!(response.status, StatusCode::Ok);
        assert!(!response.body.is_empty());

        let garbage = [("Host", "localhost"), ("If-Modified-Since", "yesterday")];
        let response = call(Method::GET, "/image.png", &garbage, b"").await;
        assert_eq!(response.status, StatusCode::Ok);
    }

    #[tokio::test]
    async fn test_missing_image_is_not_found() {
        let config = ServerConfig {
            static_dir: std::env::temp_dir().join("charset-testserver-no-such-dir"),
            ..ServerConfig::default()
        };
        let router = conformance_routes(&config);
        let result = router.dispatch(request(Method::GET, "/image.png", &[], b"")).await;
        assert!(matches!(result, Err(Error::NotFound(_, _))));
    }

    async fn spawn_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ServerConfig::default();
        let server = HttpServer::new(config.clone(), conformance_routes(&config));

        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });
        (addr, handle)
    }

    async fn exchange(addr: std::net::SocketAddr, raw: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_header_casing_on_the_wire() {
        let (addr, handle) = spawn_server().await;

        let response = exchange(addr, b"GET /headers-test HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await;
        let response = String::from_utf8(response).unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("\r\nx-test-1: foo\r\n"));
        assert!(response.contains("\r\nOTHER-TEST: bar\r\n"));
        assert!(response.ends_with("\r\n\r\nHeadersTest"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_latin1_round_trip_on_the_wire() {
        let (addr, handle) = spawn_server().await;

        let body = encode_with_label(REQUEST_TEXT, "latin1").unwrap();
        let mut raw = format!(
            "POST /request-latin-1 HTTP/1.1\r\nHost: localhost\r\nContent-Type: text/plain; charset=latin1\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        raw.extend_from_slice(&body);

        let response = exchange(addr, &raw).await;
        assert!(response.ends_with(b"\r\n\r\nOK"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_sorted_headers_keep_latin1_bytes_on_the_wire() {
        let (addr, handle) = spawn_server().await;

        let response = exchange(
            addr,
            b"GET /sorted-headers HTTP/1.1\r\nHost: localhost\r\nX-Name: caf\xE9\r\nConnection: close\r\n\r\n",
        )
        .await;
        let response = String::from_utf8(response).unwrap();

        assert!(response.ends_with("\r\n\r\nconnection: close\nhost: localhost\nx-name: café"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_redirect_308_followed_on_one_connection() {
        let (addr, handle) = spawn_server().await;

        let raw = b"POST /redirect-308 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 3\r\n\r\nabc\
POST /redirect-308-2 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc";
        let response = String::from_utf8(exchange(addr, raw).await).unwrap();

        assert!(response.starts_with("HTTP/1.1 308 Permanent Redirect\r\n"));
        assert!(response.contains("\r\nLocation: /redirect-308-2\r\n"));
        assert!(response.ends_with("\r\n\r\nRedirect successful"));

        handle.abort();
    }
}
