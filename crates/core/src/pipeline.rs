//! 파이프라인 trait — 모듈 확장 포인트 정의
//!
//! - [`Pipeline`]: 데몬이 관리하는 모듈의 생명주기 (start/stop/health_check)
//! - [`DynPipeline`]: `Box<dyn DynPipeline>`으로 모듈을 동적 관리하기 위한 dyn 호환 버전
//! - [`Sink`]: 집계 결과를 외부 저장소로 내보내는 영속화 싱크

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::error::SpeedyError;
use crate::types::{DeviceMetadata, DeviceReport};

/// 박싱된 Send Future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 모듈 건강 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// 정상 동작
    Healthy,
    /// 동작하지만 일부 기능 저하
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 여부
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불가 상태인지 여부
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 데몬이 관리하는 모듈의 생명주기 trait
///
/// 캡처 엔진과 집계기가 이 trait을 구현하며, `speedy-daemon`이
/// 동일한 방식으로 시작/정지/상태 확인을 수행합니다.
pub trait Pipeline: Send {
    /// 모듈을 시작합니다. 이미 실행 중이면 `PipelineError::AlreadyRunning`.
    fn start(&mut self) -> impl Future<Output = Result<(), SpeedyError>> + Send;

    /// 모듈을 정지합니다. 실행 중이 아니면 `PipelineError::NotRunning`.
    fn stop(&mut self) -> impl Future<Output = Result<(), SpeedyError>> + Send;

    /// 현재 건강 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// dyn 호환 파이프라인 trait
///
/// `Pipeline` trait은 RPITIT를 사용하므로 `dyn Pipeline`이 불가합니다.
/// `DynPipeline`은 `BoxFuture`를 반환하여 `Vec<Box<dyn DynPipeline>>`으로
/// 모듈을 동적 관리할 수 있게 합니다.
pub trait DynPipeline: Send + Sync {
    /// 모듈을 시작합니다.
    fn start(&mut self) -> BoxFuture<'_, Result<(), SpeedyError>>;

    /// 모듈을 정지합니다.
    fn stop(&mut self) -> BoxFuture<'_, Result<(), SpeedyError>>;

    /// 모듈의 건강 상태를 확인합니다.
    fn health_check(&self) -> BoxFuture<'_, HealthStatus>;
}

/// Pipeline을 구현한 타입은 자동으로 DynPipeline도 구현됩니다.
impl<T: Pipeline + Sync> DynPipeline for T {
    fn start(&mut self) -> BoxFuture<'_, Result<(), SpeedyError>> {
        Box::pin(Pipeline::start(self))
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), SpeedyError>> {
        Box::pin(Pipeline::stop(self))
    }

    fn health_check(&self) -> BoxFuture<'_, HealthStatus> {
        Box::pin(Pipeline::health_check(self))
    }
}

/// 영속화 싱크 trait
///
/// 집계기는 플러시 주기마다 [`store_batch`](Self::store_batch)를,
/// 장치 IP가 바뀔 때마다 [`store_metadata`](Self::store_metadata)를
/// 독립 태스크에서 호출합니다. 호출자는 결과를 기다리지 않으며
/// 실패는 로그와 메트릭으로만 보고됩니다.
///
/// `Send + Sync + 'static`이므로 `Arc<S>`로 태스크 간에 공유됩니다.
pub trait Sink: Send + Sync + 'static {
    /// 백엔드 이름 (로그/메트릭 레이블용)
    fn name(&self) -> &str;

    /// 한 플러시 주기의 장치별 카운터를 저장합니다. 빈 배치일 수 있습니다.
    fn store_batch(
        &self,
        reports: Vec<DeviceReport>,
    ) -> impl Future<Output = Result<(), SpeedyError>> + Send;

    /// 한 장치의 주소 메타데이터를 저장합니다.
    ///
    /// 선택적 기능입니다. 기본 구현은 아무 것도 하지 않습니다.
    fn store_metadata(
        &self,
        metadata: DeviceMetadata,
    ) -> impl Future<Output = Result<(), SpeedyError>> + Send {
        let _ = metadata;
        async { Ok(()) }
    }
}
