//! # speedy-aggregator
//!
//! 캡처된 프레임을 장치(MAC)별 업로드/다운로드 바이트로 집계하고,
//! 주기적으로 싱크에 플러시하며, 오래된 장치를 제거합니다.
//!
//! # 모듈 구성
//! - [`classifier`]: 방향 정규화, 브로드캐스트/멀티캐스트 필터, 방향 결정
//! - [`device`]: 장치 레코드
//! - [`store`]: 동시 접근 가능한 집계 저장소
//! - [`scheduler`]: 플러시/제거 스케줄러
//! - [`notifier`]: IP 변경 알림과 메타데이터 디스패처
//! - [`aggregator`]: 위 구성요소를 묶는 [`Aggregator`] (`Pipeline` 구현)

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod device;
pub mod error;
pub mod notifier;
pub mod scheduler;
pub mod stats;
pub mod store;

pub use aggregator::{Aggregator, AggregatorBuilder};
pub use classifier::{Attribution, Direction, DropReason, Verdict, classify};
pub use config::AggregatorSettings;
pub use error::AggregatorError;
pub use notifier::MetadataNotifier;
pub use scheduler::FlushScheduler;
pub use stats::{AggregatorStats, StatsSnapshot};
pub use store::DeviceStore;
