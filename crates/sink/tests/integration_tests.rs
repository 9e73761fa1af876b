//! 통합 테스트 -- InfluxDB HTTP 쓰기 요청 형식과 실패 처리
//!
//! 로컬 TCP 리스너로 최소한의 HTTP 서버를 흉내 내어 요청을 캡처합니다.

use std::net::Ipv4Addr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use speedy_core::config::SinkConfig;
use speedy_core::error::{SinkError, SpeedyError};
use speedy_core::pipeline::Sink;
use speedy_core::types::{DeviceMetadata, DeviceReport, MacAddr};
use speedy_sink::{InfluxDbSink, SinkBackend, TimescaleDbSink};

mod mock {
    use super::*;

    /// 캡처된 요청
    pub struct CapturedRequest {
        pub request_line: String,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl CapturedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// 요청 하나를 받고 지정한 상태로 응답하는 서버를 띄웁니다.
    pub async fn serve_once(
        status_line: &'static str,
        response_body: &'static str,
    ) -> (String, oneshot::Receiver<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let header_end = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
            let mut lines = head.split("\r\n");
            let request_line = lines.next().unwrap_or_default().to_owned();
            let headers: Vec<(String, String)> = lines
                .filter_map(|l| l.split_once(':'))
                .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
                .collect();
            let content_length = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.parse::<usize>().ok())
                .unwrap_or(0);

            while buf.len() < header_end + content_length {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

            let response = format!(
                "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response_body}",
                response_body.len()
            );
            let _ = tx.send(CapturedRequest {
                request_line,
                headers,
                body,
            });
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        });

        (url, rx)
    }
}

fn laptop_report() -> DeviceReport {
    DeviceReport {
        mac: MacAddr::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]),
        ipv4: Some(Ipv4Addr::new(192, 168, 1, 20)),
        ipv6: None,
        upload_bytes: 100,
        download_bytes: 250,
    }
}

fn influx_config(url: String) -> SinkConfig {
    SinkConfig {
        backend: "influxdb".to_owned(),
        url,
        database: "speedy".to_owned(),
        username: "admin".to_owned(),
        password: "secret".to_owned(),
        timeout_secs: 5,
    }
}

/// 배치는 /write?db=..&precision=ns 로 POST 되고 Basic 인증을 포함
#[tokio::test]
async fn batch_is_posted_as_line_protocol() {
    let (url, captured) = mock::serve_once("HTTP/1.1 204 No Content", "").await;
    let sink = InfluxDbSink::new(&influx_config(url)).unwrap();

    sink.store_batch(vec![laptop_report()]).await.unwrap();

    let req = captured.await.unwrap();
    assert!(req.request_line.starts_with("POST /write?"));
    assert!(req.request_line.contains("db=speedy"));
    assert!(req.request_line.contains("precision=ns"));
    // "admin:secret"
    assert_eq!(req.header("authorization"), Some("Basic YWRtaW46c2VjcmV0"));
    assert_eq!(req.header("user-agent"), Some("speedy"));

    let line = req.body.trim_end();
    assert!(line.starts_with(
        "measures,mac=11:22:33:44:55:66 download=250i,upload=100i,ipv4=\"192.168.1.20\" "
    ));
    let ts = line.rsplit(' ').next().unwrap();
    assert!(ts.parse::<u128>().unwrap() > 1_600_000_000_000_000_000);
}

/// 사용자 이름이 비어 있으면 인증 헤더를 보내지 않음
#[tokio::test]
async fn anonymous_write_has_no_authorization() {
    let (url, captured) = mock::serve_once("HTTP/1.1 204 No Content", "").await;
    let mut config = influx_config(url);
    config.username.clear();
    config.password.clear();
    let sink = InfluxDbSink::new(&config).unwrap();

    sink.store_batch(vec![laptop_report()]).await.unwrap();

    let req = captured.await.unwrap();
    assert!(req.header("authorization").is_none());
}

/// 2xx가 아닌 응답은 쓰기 에러로 보고됨
#[tokio::test]
async fn server_error_is_reported() {
    let (url, _captured) = mock::serve_once(
        "HTTP/1.1 404 Not Found",
        "{\"error\":\"database not found: \\\"speedy\\\"\"}",
    )
    .await;
    let sink = InfluxDbSink::new(&influx_config(url)).unwrap();

    let err = sink.store_batch(vec![laptop_report()]).await.unwrap_err();
    match err {
        SpeedyError::Sink(SinkError::Write(msg)) => {
            assert!(msg.contains("404"));
            assert!(msg.contains("database not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// 연결할 수 없는 서버는 연결 에러로 보고됨
#[tokio::test]
async fn unreachable_server_is_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let sink = InfluxDbSink::new(&influx_config(url)).unwrap();
    let err = sink.store_batch(vec![laptop_report()]).await.unwrap_err();
    assert!(matches!(err, SpeedyError::Sink(SinkError::Connection(_))));
}

/// 백엔드 선택을 거쳐도 같은 요청이 나감
#[tokio::test]
async fn backend_delegates_to_influxdb() {
    let (url, captured) = mock::serve_once("HTTP/1.1 204 No Content", "").await;
    let backend = SinkBackend::from_config(&influx_config(url)).unwrap();
    assert_eq!(backend.name(), "influxdb");

    backend.store_batch(vec![laptop_report()]).await.unwrap();
    let req = captured.await.unwrap();
    assert!(req.body.contains("mac=11:22:33:44:55:66"));
}

fn timescale_config(url: String) -> SinkConfig {
    SinkConfig {
        backend: "timescaledb".to_owned(),
        url,
        database: "measures".to_owned(),
        timeout_secs: 5,
        ..SinkConfig::default()
    }
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// TimescaleDB 서버에 연결할 수 없으면 배치와 메타데이터 모두 연결 에러
#[tokio::test]
async fn unreachable_timescaledb_is_connection_error() {
    let port = closed_port().await;
    let sink =
        TimescaleDbSink::new(&timescale_config(format!("postgres://speedy@127.0.0.1:{port}/home")))
            .unwrap();

    let err = sink.store_batch(vec![laptop_report()]).await.unwrap_err();
    assert!(matches!(err, SpeedyError::Sink(SinkError::Connection(_))), "got: {err}");

    let err = sink
        .store_metadata(DeviceMetadata {
            mac: laptop_report().mac,
            ipv4: Some(Ipv4Addr::new(192, 168, 1, 20)),
            ipv6: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SpeedyError::Sink(SinkError::Connection(_))), "got: {err}");
}

/// 빈 배치는 서버에 접속하지 않고 성공
#[tokio::test]
async fn timescaledb_skips_empty_batch() {
    let port = closed_port().await;
    let backend = SinkBackend::from_config(&timescale_config(format!(
        "postgres://speedy@127.0.0.1:{port}/home"
    )))
    .unwrap();
    assert_eq!(backend.name(), "timescaledb");

    backend.store_batch(Vec::new()).await.unwrap();
}
