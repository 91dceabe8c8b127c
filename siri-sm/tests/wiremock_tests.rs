//! Integration tests for the HTTP transport using WireMock
//!
//! A mock supplier checks what goes over the wire and answers with the
//! canned responses under `data/responses`.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, FixedOffset};
use siri_sm::config::{SubscribeConfig, SupplierConfig, TransportConfig};
use siri_sm::domain::StopPointId;
use siri_sm::siri::{
    HttpTransport, RemoteError, SiriClient, SiriError, SoapAction, Transport,
    build_check_status,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

const CHECK_STATUS: &str = include_str!("../data/responses/CheckStatus.xml");
const STOP_MONITORING: &str = include_str!("../data/responses/GetStopMonitoring.xml");
const SUBSCRIBE: &str = include_str!("../data/responses/Subscribe.xml");

// =============================================================================
// Test Helpers
// =============================================================================

fn at() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2022-08-30T04:34:46+02:00").unwrap()
}

fn supplier(server: &MockServer) -> SupplierConfig {
    SupplierConfig::new(format!("{}/siri", server.uri()), "NAVITIA")
}

fn client() -> SiriClient<HttpTransport> {
    SiriClient::new(HttpTransport::new(TransportConfig::default().with_timeout(5)))
}

fn xml_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/xml; charset=utf-8")
}

/// Accept one connection, answer it with `reply` and hand back the request
/// exactly as it was written to the socket.
fn capture_one_request(reply: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/siri", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut head = String::new();
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            head.push_str(&line);
            if line.is_empty() || line == "\r\n" {
                break;
            }
        }

        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();

        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Type: text/xml; charset=utf-8\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{reply}",
            reply.len()
        )
        .unwrap();
        stream.flush().unwrap();

        head + &String::from_utf8(body).unwrap()
    });

    (url, handle)
}

// =============================================================================
// Transport
// =============================================================================

#[tokio::test]
async fn sends_soap_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/siri"))
        .and(header("content-type", "text/xml; charset=utf-8"))
        .and(header("SOAPAction", "CheckStatus"))
        .and(body_string_contains("<sw:CheckStatus>"))
        .and(body_string_contains("NAVITIA:ResponseMessage:20220830_043446"))
        .respond_with(xml_response(CHECK_STATUS))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(TransportConfig::default());
    let request = build_check_status(&supplier(&server), &at()).unwrap();
    let response = transport.send(&request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, CHECK_STATUS.as_bytes());
    assert!(
        response
            .headers
            .iter()
            .any(|(name, value)| name.eq_ignore_ascii_case("content-type")
                && value.starts_with("text/xml"))
    );
}

#[tokio::test]
async fn header_names_keep_their_spelling_on_the_wire() {
    let (url, server) = capture_one_request(CHECK_STATUS);

    let transport = HttpTransport::new(TransportConfig::default().with_timeout(5));
    let request = build_check_status(&SupplierConfig::new(url, "NAVITIA"), &at()).unwrap();
    let response = transport.send(&request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, CHECK_STATUS.as_bytes());

    let wire = server.join().unwrap();
    assert!(wire.starts_with("POST /siri HTTP/1.1\r\n"), "{wire}");
    assert!(wire.contains("\r\nSOAPAction: CheckStatus\r\n"), "{wire}");
    assert!(
        wire.contains("\r\nContent-Type: text/xml; charset=utf-8\r\n"),
        "{wire}"
    );
    assert!(!wire.contains("soapaction:"), "{wire}");
    assert!(wire.ends_with(request.body()));
}

#[tokio::test]
async fn error_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(TransportConfig::default());
    let request = build_check_status(&supplier(&server), &at()).unwrap();
    let response = transport.send(&request).await.unwrap();

    assert_eq!(response.status, 503);
    assert!(!response.is_success());
    assert_eq!(response.body, b"maintenance");
}

// =============================================================================
// Client Flows
// =============================================================================

#[tokio::test]
async fn check_status_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", "CheckStatus"))
        .respond_with(xml_response(CHECK_STATUS))
        .mount(&server)
        .await;

    let result = client()
        .check_status(&supplier(&server), &at())
        .await
        .into_result()
        .unwrap();
    assert_eq!(
        result.service_started_time.to_rfc3339(),
        "2022-08-29T03:12:05.381+02:00"
    );
}

#[tokio::test]
async fn stop_monitoring_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", "GetStopMonitoring"))
        .and(body_string_contains("ILEVIA:StopPoint:BP:CAS001:LOC"))
        .respond_with(xml_response(STOP_MONITORING))
        .mount(&server)
        .await;

    let delivery = client()
        .get_stop_monitoring(&supplier(&server), &at(), "ILEVIA:StopPoint:BP:CAS001:LOC")
        .await
        .into_result()
        .unwrap();
    assert_eq!(delivery.visits.len(), 1);
    assert_eq!(delivery.visits[0].journey.destination_name, "CHU-Eurasante");
}

#[tokio::test]
async fn subscribe_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", "Subscribe"))
        .and(body_string_contains("<siri:ConsumerAddress>"))
        .respond_with(xml_response(SUBSCRIBE))
        .mount(&server)
        .await;

    let stops = (0..50).map(|i| StopPointId::new(format!("S{i:03}")).unwrap());
    let config = SubscribeConfig::new(supplier(&server), "http://localhost:9090/push", "ILEVIA")
        .with_stop_points(stops);

    let statuses = client()
        .subscribe(&config, &at())
        .await
        .into_result()
        .unwrap();
    assert_eq!(statuses.len(), 50);
    assert!(statuses.iter().all(|s| s.accepted));
}

#[tokio::test]
async fn server_error_is_remote_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<fault/>"))
        .mount(&server)
        .await;

    let exchange = client().check_status(&supplier(&server), &at()).await;

    assert!(exchange.request_body.unwrap().contains("<sw:CheckStatus>"));
    assert_eq!(exchange.response_body.as_deref(), Some(&b"<fault/>"[..]));
    assert!(matches!(
        exchange.result,
        Err(SiriError::Remote {
            operation: SoapAction::CheckStatus,
            source: RemoteError::UnexpectedHttpStatus { status: 500 },
        })
    ));
}

#[tokio::test]
async fn unreachable_supplier_is_call_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = SupplierConfig::new(format!("http://127.0.0.1:{port}/siri"), "NAVITIA");

    let exchange = client().check_status(&config, &at()).await;

    assert!(exchange.response_body.is_none());
    assert!(matches!(
        exchange.result,
        Err(SiriError::Remote {
            source: RemoteError::Transport(_),
            ..
        })
    ));
}
