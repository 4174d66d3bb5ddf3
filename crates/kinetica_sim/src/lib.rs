pub mod backend;
pub mod engine;
pub mod gpu;
pub mod parallel;
pub mod sequential;

pub use backend::{ExecutionBackend, PassError};
pub use engine::{BackendKind, BodySnapshot, EngineError, FrameSnapshot, SimulationEngine};
pub use gpu::GpuBackend;
pub use parallel::WorkerParallelBackend;
pub use sequential::SequentialBackend;
