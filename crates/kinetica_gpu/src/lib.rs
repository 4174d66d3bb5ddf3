pub mod buffers;
pub mod context;
pub mod dispatch;

pub use buffers::ReadbackBuffer;
pub use context::{GpuContext, GpuError, SimParams};
pub use dispatch::dispatch_substep;
