#![warn(missing_docs)]
//! Procedural terrain made of hexagonal prisms.
//!
//! A build runs in three stages:
//!
//! 1. [`placement::place_grid`] tiles a square region with staggered hexagon
//!    centers and samples a [`sampler::HeightSampler`] at each one.
//! 2. [`topology::HexagonBuilder`] turns every center into a closed prism of
//!    35 vertices and 18 triangles.
//! 3. [`batch::combine`] merges the prisms, in order, into chunked meshes.
//!
//! [`rebuild`] ties the stages together and supports cancelling a build once
//! a newer one has been requested.

pub mod batch;
pub mod config;
pub mod error;
pub mod math;
pub mod placement;
pub mod rebuild;
pub mod sampler;
pub mod topology;
