use std::net::TcpListener;
use std::time::Duration;

use getman::config::Config;
use getman::models::{HeaderEntry, HttpMethod};
use getman::network::{ExchangeError, ExchangeSpec, HttpExecutor};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn executor() -> HttpExecutor {
    HttpExecutor::new(&Config::default()).unwrap()
}

fn spec(method: HttpMethod, url: String) -> ExchangeSpec {
    ExchangeSpec {
        method,
        url,
        headers: Vec::new(),
        body: String::new(),
    }
}

#[tokio::test]
async fn get_reports_status_size_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let response = executor()
        .execute(spec(HttpMethod::GET, format!("{}/health", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.size_bytes, 2);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn non_success_status_is_still_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    let response = executor()
        .execute(spec(HttpMethod::DELETE, format!("{}/items/9", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status_code, 404);
    assert_eq!(response.body, "missing");
}

#[tokio::test]
async fn patch_sends_verb_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/items/1"))
        .and(header("x-trace", "abc"))
        .and(body_string("{\"done\":true}"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = spec(HttpMethod::PATCH, format!("{}/items/1", server.uri()));
    request.headers = vec![HeaderEntry::new("X-Trace", "abc"), HeaderEntry::new("", "dropped")];
    request.body = "{\"done\":true}".into();

    let response = executor().execute(request).await.unwrap();
    assert_eq!(response.status_code, 204);
    assert_eq!(response.size_bytes, 0);
}

#[tokio::test]
async fn json_body_is_pretty_printed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("{\"id\":7,\"tags\":[\"a\"]}", "application/json"),
        )
        .mount(&server)
        .await;

    let response = executor()
        .execute(spec(HttpMethod::GET, format!("{}/user", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.raw_body, "{\"id\":7,\"tags\":[\"a\"]}");
    assert_eq!(response.body, "{\n  \"id\": 7,\n  \"tags\": [\n    \"a\"\n  ]\n}");
    assert_eq!(response.size_bytes, response.raw_body.len());
}

#[tokio::test]
async fn repeated_response_headers_are_joined() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("x-multi", "one")
                .append_header("x-multi", "two"),
        )
        .mount(&server)
        .await;

    let response = executor()
        .execute(spec(HttpMethod::GET, server.uri()))
        .await
        .unwrap();

    let multi = response
        .headers
        .iter()
        .find(|h| h.key == "x-multi")
        .unwrap();
    assert_eq!(multi.value, "one, two");
}

#[tokio::test]
async fn refused_connection_is_a_connect_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let failure = executor()
        .execute(spec(HttpMethod::GET, format!("http://127.0.0.1:{}/", port)))
        .await
        .unwrap_err();

    assert!(
        matches!(failure.error, ExchangeError::Connect(_)),
        "unexpected error: {:?}",
        failure.error
    );
}

#[tokio::test]
async fn invalid_urls_fail_before_dispatch() {
    let failure = executor()
        .execute(spec(HttpMethod::GET, "   ".into()))
        .await
        .unwrap_err();
    assert_eq!(failure.error, ExchangeError::EmptyUrl);
    assert_eq!(failure.duration_ms, 0);

    let failure = executor()
        .execute(spec(HttpMethod::GET, "not a url".into()))
        .await
        .unwrap_err();
    assert!(matches!(failure.error, ExchangeError::InvalidUrl { .. }));
}

#[tokio::test]
async fn slow_server_times_out_instead_of_hanging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = Config {
        request_timeout: Duration::from_millis(500),
        ..Config::default()
    };
    let executor = HttpExecutor::new(&config).unwrap();

    let failure = executor
        .execute(spec(HttpMethod::GET, format!("{}/slow", server.uri())))
        .await
        .unwrap_err();

    assert_eq!(failure.error, ExchangeError::Timeout);
    assert!(
        (450..2500).contains(&failure.duration_ms),
        "duration {} ms",
        failure.duration_ms
    );
}

#[tokio::test]
async fn body_is_decoded_with_declared_charset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![b'c', b'a', b'f', 0xE9], "text/plain; charset=iso-8859-1"),
        )
        .mount(&server)
        .await;

    let response = executor()
        .execute(spec(HttpMethod::GET, server.uri()))
        .await
        .unwrap();

    assert_eq!(response.body, "café");
    assert_eq!(response.size_bytes, 4);
}
