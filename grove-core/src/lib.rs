//! Core library for a procedurally animated forest scene.
//!
//! Main components:
//! - [`geometry`]: recursive fractal tree segments.
//! - [`growth`]: timed stroke-by-stroke reveal of a tree.
//! - [`lock`]: one growth cycle at a time.
//! - [`fade`]: aging of previously drawn trees.
//! - [`forest`]: the layer trees are drawn on.
//! - [`sky`]: day/night palette, sun and moon, star field.
//! - [`ground`]: terrain band tinted by the sky's ambience.
//! - [`scene`]: ties the layers together behind input and tick handlers.
//! - [`raster`]: RGBA pixel buffers and the drawing surface trait.
//! - [`config`] / [`error`]: tunable parameters and their validation.
//! - [`types`]: shared type aliases.

pub mod config;
pub mod error;
pub mod fade;
pub mod forest;
pub mod geometry;
pub mod ground;
pub mod growth;
pub mod lock;
pub mod raster;
pub mod scene;
pub mod sky;
pub mod types;
