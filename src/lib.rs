//! Spacetime grid library
//!
//! An interactive gravity sandbox: point masses warp a deformable grid, move
//! under their mutual attraction, and can be walked among in first person.

pub mod config;
pub mod constants;
pub mod controls;
pub mod error;
pub mod field;
pub mod graphics;
pub mod mass;
pub mod observer;
pub mod rendering;
pub mod simulation;
pub mod spawn;
pub mod view;
