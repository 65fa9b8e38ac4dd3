//! Config - 엔진 설정 관리
//!
//! - `engine.rs` - 호스트/플러그인 공용 key-value 설정 (EngineConfig)

mod engine;

pub use engine::{EngineConfig, ENGINE_VERSION_KEY};
