//! InfluxDB 1.x 싱크 — HTTP `/write` 엔드포인트에 line protocol로 배치 저장
//!
//! 장치당 한 포인트를 기록합니다.
//!
//! ```text
//! measures,mac=11:22:33:44:55:66 download=250i,upload=100i,ipv4="192.168.1.20" 1700000000000000000
//! ```
//!
//! 메타데이터 저장은 지원하지 않으며 기본 no-op 구현을 사용합니다.

use std::fmt::Write as _;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use speedy_core::config::SinkConfig;
use speedy_core::error::SpeedyError;
use speedy_core::pipeline::Sink;
use speedy_core::types::DeviceReport;

use crate::error::SinkBackendError;

/// 측정값 이름
pub const MEASUREMENT: &str = "measures";

/// HTTP User-Agent
pub const USER_AGENT: &str = "speedy";

/// 에러 메시지에 포함할 응답 본문 최대 길이
const MAX_ERROR_BODY: usize = 256;

/// InfluxDB 싱크
#[derive(Debug, Clone)]
pub struct InfluxDbSink {
    client: reqwest::Client,
    write_url: String,
    database: String,
    username: String,
    password: String,
}

impl InfluxDbSink {
    /// 싱크 설정으로 HTTP 클라이언트를 생성합니다.
    ///
    /// 연결은 첫 저장 시점에 이루어집니다.
    pub fn new(config: &SinkConfig) -> Result<Self, SinkBackendError> {
        let url = config.url.trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SinkBackendError::Config {
                field: "url".to_owned(),
                reason: format!("'{}' must start with http:// or https://", config.url),
            });
        }
        if config.database.is_empty() {
            return Err(SinkBackendError::Config {
                field: "database".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            write_url: format!("{url}/write"),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// 쓰기 엔드포인트 URL
    pub fn write_url(&self) -> &str {
        &self.write_url
    }

    async fn write(&self, body: String) -> Result<(), SinkBackendError> {
        let mut request = self
            .client
            .post(&self.write_url)
            .query(&[("db", self.database.as_str()), ("precision", "ns")])
            .body(body);
        if !self.username.is_empty() {
            let password = (!self.password.is_empty()).then_some(&self.password);
            request = request.basic_auth(&self.username, password);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        Err(SinkBackendError::Status {
            status: status.as_u16(),
            body: body.trim().to_owned(),
        })
    }
}

impl Sink for InfluxDbSink {
    fn name(&self) -> &str {
        "influxdb"
    }

    async fn store_batch(&self, reports: Vec<DeviceReport>) -> Result<(), SpeedyError> {
        if reports.is_empty() {
            return Ok(());
        }

        let body = encode_line_protocol(&reports, unix_nanos());
        self.write(body).await?;
        debug!(points = reports.len(), database = %self.database, "wrote points to influxdb");
        Ok(())
    }
}

fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}

/// 리포트 목록을 line protocol 본문으로 인코딩합니다. 한 줄에 한 장치입니다.
pub fn encode_line_protocol(reports: &[DeviceReport], timestamp_ns: u128) -> String {
    let mut out = String::with_capacity(reports.len() * 96);
    for report in reports {
        out.push_str(MEASUREMENT);
        out.push_str(",mac=");
        escape_tag(&mut out, &report.mac.to_string());
        let _ = write!(
            out,
            " download={}i,upload={}i",
            clamp_i64(report.download_bytes),
            clamp_i64(report.upload_bytes)
        );
        if let Some(ip) = report.ipv4 {
            let _ = write!(out, ",ipv4=\"{ip}\"");
        }
        if let Some(ip) = report.ipv6 {
            let _ = write!(out, ",ipv6=\"{ip}\"");
        }
        let _ = writeln!(out, " {timestamp_ns}");
    }
    out
}

/// InfluxDB 1.x 정수 필드는 부호 있는 64비트
fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn escape_tag(out: &mut String, value: &str) {
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
}
