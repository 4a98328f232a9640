//! Mesh processing algorithms built on the half-edge kernel.
//!
//! - **Boundary**: boundary loop tracing, loop segmentation at marker
//!   vertices, quadrilateral boundaries with four corners

pub mod boundary;
