pub mod event;
pub mod scene;
pub mod step;
pub mod world;
