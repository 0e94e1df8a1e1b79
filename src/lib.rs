//! Pixelsmith: a layered pixel-art engine.
//!
//! Layers and brushes ([`canvas`], [`ops`]), undo history and animation
//! ([`components`]), compositing ([`compositor`]) and project files / image
//! export ([`io`]), all driven through one editing session ([`project`]).

pub mod canvas;
pub mod cli;
pub mod components;
pub mod compositor;
pub mod io;
pub mod logger;
pub mod ops;
pub mod project;
pub mod settings;
