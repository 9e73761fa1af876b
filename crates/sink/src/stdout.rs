//! JSON Lines 싱크
//!
//! 플러시마다 장치당 한 줄(`"kind":"measure"`)을, 주소 변경마다 한 줄
//! (`"kind":"metadata"`)을 출력합니다. 데이터베이스 없이 동작을 확인할 때 씁니다.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use speedy_core::error::SpeedyError;
use speedy_core::pipeline::Sink;
use speedy_core::types::{DeviceMetadata, DeviceReport, MacAddr};

use crate::error::SinkBackendError;

/// 출력 한 줄
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Line<'a> {
    Measure {
        timestamp_ms: u128,
        mac: &'a MacAddr,
        ipv4: Option<Ipv4Addr>,
        ipv6: Option<Ipv6Addr>,
        upload: u64,
        download: u64,
    },
    Metadata {
        timestamp_ms: u128,
        mac: &'a MacAddr,
        ipv4: Option<Ipv4Addr>,
        ipv6: Option<Ipv6Addr>,
    },
}

/// 임의의 비동기 출력 스트림에 JSON Lines를 쓰는 싱크
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

/// 표준 출력 싱크
pub type StdoutSink = JsonLinesSink<tokio::io::Stdout>;

impl StdoutSink {
    /// 프로세스 표준 출력에 쓰는 싱크를 생성합니다.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// 주어진 스트림 위에 싱크를 생성합니다.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// 내부 스트림을 돌려받습니다.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn write_lines(&self, lines: &[Line<'_>]) -> Result<(), SinkBackendError> {
        let mut buf = Vec::with_capacity(lines.len() * 128);
        for line in lines {
            serde_json::to_writer(&mut buf, line)?;
            buf.push(b'\n');
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(())
    }
}

impl<W> Sink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        "stdout"
    }

    async fn store_batch(&self, reports: Vec<DeviceReport>) -> Result<(), SpeedyError> {
        if reports.is_empty() {
            return Ok(());
        }
        let timestamp_ms = unix_millis();
        let lines: Vec<Line<'_>> = reports
            .iter()
            .map(|r| Line::Measure {
                timestamp_ms,
                mac: &r.mac,
                ipv4: r.ipv4,
                ipv6: r.ipv6,
                upload: r.upload_bytes,
                download: r.download_bytes,
            })
            .collect();
        self.write_lines(&lines).await?;
        Ok(())
    }

    async fn store_metadata(&self, metadata: DeviceMetadata) -> Result<(), SpeedyError> {
        let line = Line::Metadata {
            timestamp_ms: unix_millis(),
            mac: &metadata.mac,
            ipv4: metadata.ipv4,
            ipv6: metadata.ipv6,
        };
        self.write_lines(std::slice::from_ref(&line)).await?;
        Ok(())
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(sink: JsonLinesSink<Vec<u8>>) -> Vec<serde_json::Value> {
        let out = String::from_utf8(sink.into_inner()).unwrap();
        out.lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn batch_writes_one_line_per_device() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.store_batch(vec![
            DeviceReport {
                mac: MacAddr::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]),
                ipv4: Some(Ipv4Addr::new(192, 168, 1, 20)),
                ipv6: None,
                upload_bytes: 100,
                download_bytes: 250,
            },
            DeviceReport {
                mac: MacAddr::new([0x02, 0, 0, 0, 0, 1]),
                ipv4: None,
                ipv6: None,
                upload_bytes: 0,
                download_bytes: 7,
            },
        ])
        .await
        .unwrap();

        let out = lines(sink);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["kind"], "measure");
        assert_eq!(out[0]["mac"], "11:22:33:44:55:66");
        assert_eq!(out[0]["ipv4"], "192.168.1.20");
        assert_eq!(out[0]["upload"], 100);
        assert_eq!(out[0]["download"], 250);
        assert!(out[1]["ipv4"].is_null());
    }

    #[tokio::test]
    async fn empty_batch_writes_nothing() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.store_batch(Vec::new()).await.unwrap();
        assert!(sink.into_inner().is_empty());
    }

    #[tokio::test]
    async fn metadata_writes_single_line() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.store_metadata(DeviceMetadata {
            mac: MacAddr::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]),
            ipv4: None,
            ipv6: Some("fe80::20".parse().unwrap()),
        })
        .await
        .unwrap();

        let out = lines(sink);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["kind"], "metadata");
        assert_eq!(out[0]["ipv6"], "fe80::20");
        assert!(out[0].get("upload").is_none());
    }

    #[test]
    fn name_is_stdout() {
        assert_eq!(JsonLinesSink::new(Vec::<u8>::new()).name(), "stdout");
    }
}
