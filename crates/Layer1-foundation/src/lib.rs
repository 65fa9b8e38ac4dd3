//! # lowcode-foundation
//!
//! Foundation layer for the low-code engine:
//! - Error: 플러그인 시스템 에러 분류 (등록/초기화/훅 실행)
//! - Config: 호스트와 플러그인이 공유하는 EngineConfig (`ENGINE_VERSION` 예약 키)
//! - Version: 플러그인 엔진 버전 요구사항 매칭 (pre-release 포함)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  lowcode-core (PluginManager, Sequencer, Context)       │
//! │                     │                                   │
//! │          ┌──────────┴──────────┐                        │
//! │          ▼                     ▼                        │
//! │    EngineConfig          version::satisfies             │
//! │    (key-value)           (semver range matching)        │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod version;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{EngineConfig, ENGINE_VERSION_KEY};
