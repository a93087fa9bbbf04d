//! Tubequeue engine: backend I/O and the driver that executes core effects.
mod backend;
mod clock;
mod engine;
mod persist;
mod types;
mod wire;

pub use backend::{Backend, BackendSettings, ReqwestBackend, SubmitReceipt, DEFAULT_BASE_URL};
pub use clock::now_ms;
pub use engine::{EngineHandle, EngineTiming};
pub use persist::{PersistError, StateFile};
pub use types::{BackendError, EngineEvent, FailureKind};
pub use wire::{decode_state, decode_submit_response, encode_config_patch};
