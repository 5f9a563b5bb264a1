pub mod economy;
pub mod grid;
pub mod item;
pub mod mining;
pub mod physics;
pub mod shop;
pub mod terrain;
pub mod tile;
pub mod visibility;
