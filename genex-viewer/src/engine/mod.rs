pub mod camera;
pub mod core;
pub mod scene;
#[cfg(not(target_arch = "wasm32"))]
pub mod systems;
pub mod viewport;
