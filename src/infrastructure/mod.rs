//! 基础设施层
//!
//! 持有页面资源，只暴露读写能力，不认识答题流程。

pub mod browser_surface;
pub mod host_surface;
pub mod js_executor;
pub mod memory_surface;

pub use browser_surface::BrowserSurface;
pub use host_surface::HostSurface;
pub use js_executor::JsExecutor;
pub use memory_surface::{MemoryOption, MemoryQuestion, MemorySurface, SurfaceActivity};
