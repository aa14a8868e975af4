//! Interactive reveal controller for a procedurally-built treasure chest.
//!
//! The crate separates the choreography (reveal state machine, orbit
//! input, particle burst, lighting transitions) from the GPU backend so
//! the whole sequence stays testable headless.  The `render` module holds
//! the wgpu renderer; everything else runs without a window.

pub mod app;
pub mod chest;
pub mod gallery;
pub mod mesh;
pub mod orbit;
pub mod particles;
pub mod render;
pub mod reveal;
pub mod scene;

pub use app::{MountError, RevealApp};
pub use chest::{ChestModel, ChestPart, Finish, PartGroup, Shape};
pub use gallery::{Gallery, LogGallery, RecordingGallery};
pub use orbit::OrbitController;
pub use particles::ParticleBurst;
pub use render::Renderer;
pub use reveal::{RevealEffect, RevealPhase, RevealSequencer};
pub use scene::{SceneCamera, SceneContext};
