pub mod animation;
pub mod automation;
pub mod commands;
pub mod composite;
pub mod context;
pub mod error;
pub mod events;
pub mod frame;
pub mod frame_store;
pub mod grid;
pub mod pattern;
pub mod project;
pub mod reindex;
pub mod stack;
pub mod track;
pub mod transforms;
