pub mod app;
pub mod audio_engine;
pub mod audio_graph;
pub mod controller;
pub mod diagnostics;
pub mod highlight;
pub mod ipc;
pub mod render_loop;

pub use app::*;
pub use audio_engine::*;
pub use audio_graph::*;
pub use controller::*;
pub use diagnostics::*;
pub use highlight::*;
pub use ipc::*;
pub use render_loop::*;
