pub mod audio;
pub mod midi;
pub mod scene;
pub mod storage;
pub mod synth;
pub mod types;

pub use audio::*;
pub use midi::*;
pub use scene::*;
pub use storage::*;
pub use synth::*;
pub use types::*;
