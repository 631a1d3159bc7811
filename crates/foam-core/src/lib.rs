//! Secondary foam particles for a particle-based fluid solver.
//!
//! Foam is spawned where the fluid is fast and turbulent, advected through
//! the kernel-weighted fluid velocity around it, aged, and culled. Each step
//! runs three data-parallel stages over fixed-capacity buffers that share a
//! pair of atomic slot counters:
//!
//! 1. [`emission`] appends new particles to the stable buffer.
//! 2. [`advection`] pops the stable buffer, samples the fluid through the
//!    multi-level [`grid`], and appends survivors to the advected buffer.
//! 3. [`compaction`] copies the advected buffer back and rolls the counters.
//!
//! [`generator::FoamGenerator`] owns the buffers and runs the stages in
//! order. Enable the `parallel` feature to run each stage on rayon.

pub mod advection;
pub mod compaction;
pub mod config;
pub mod counters;
pub mod emission;
pub mod error;
pub mod generator;
pub mod grid;
pub mod kernel;
pub mod math;
pub mod particle;

pub use config::{FoamConfig, SimulationMode, SolverParams};
pub use error::{ConfigError, FoamResult};
pub use generator::{FoamGenerator, StepReport};
pub use grid::{MultilevelGrid, MultilevelLookup, Simplices};
pub use particle::{FluidState, FoamParticle, ParticleBuffer};
