#[cfg(feature = "parallel")]
use rayon::prelude::*;

use glam::{IVec3, Vec3};

use crate::config::SolverParams;
use crate::counters::{AppendCursor, AppendTarget, AtomicCounterBlock};
use crate::grid::{cell_size_of_level, MultilevelLookup, Simplices};
use crate::kernel::Poly6Kernel;
use crate::math::EPSILON;
use crate::particle::{FluidState, FoamParticle, ParticleBuffer};

/// Neighbours needed before foam is treated as immersed in the fluid.
pub const MIN_NEIGHBOURS: u32 = 8;

/// Neighbour cell offsets, scaled per axis by the quadrant sign. The first four stay
/// in the particle's z layer and are the only ones used in 2D.
const QUADRANT_OFFSETS: [IVec3; 8] = [
    IVec3::new(0, 0, 0),
    IVec3::new(1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(1, 1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(1, 0, 1),
    IVec3::new(0, 1, 1),
    IVec3::new(1, 1, 1),
];

/// Fluid surroundings the advection stage samples from.
pub struct Neighbourhood<'a, G: MultilevelLookup> {
    pub fluid: FluidState<'a>,
    pub simplices: &'a Simplices,
    pub grid: &'a G,
}

/// Kernel-weighted sums over the fluid particles near a point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NeighbourSample {
    pub kernel_sum: f32,
    pub velocity: Vec3,
    pub position: Vec3,
    pub count: u32,
}

impl NeighbourSample {
    /// Enough kernel support to average neighbour quantities safely.
    #[inline]
    pub fn is_immersed(&self) -> bool {
        self.kernel_sum > EPSILON && self.count > MIN_NEIGHBOURS
    }
}

/// Outcome counts of one advection pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdvectionReport {
    /// Particles written to the output buffer.
    pub advected: u32,
    /// Particles whose life ran out this step.
    pub expired: u32,
}

impl AdvectionReport {
    fn merge(self, other: Self) -> Self {
        Self {
            advected: self.advected + other.advected,
            expired: self.expired + other.expired,
        }
    }
}

/// Sample the fluid around `pos` on every active grid level.
///
/// At each level only the containing cell and the neighbours on the
/// particle's side of it are searched (8 cells in 3D, 4 in 2D), which bounds
/// the work per particle at the cost of missing some neighbours.
pub fn sample_neighbourhood<G: MultilevelLookup>(
    pos: Vec3,
    neighbourhood: &Neighbourhood<G>,
    kernel: Poly6Kernel,
    params: &SolverParams,
) -> NeighbourSample {
    let mode = params.mode;
    let fluid = &neighbourhood.fluid;
    let offset_count = if mode.is_2d() { 4 } else { 8 };
    let mut sample = NeighbourSample::default();

    for &level in neighbourhood.grid.levels() {
        let radius = cell_size_of_level(level);

        let cell = mode.flatten((pos / radius).floor());
        let pos_in_cell = pos - (cell * radius + Vec3::splat(radius * 0.5));
        let quadrant = IVec3::new(
            quadrant_sign(pos_in_cell.x),
            quadrant_sign(pos_in_cell.y),
            quadrant_sign(pos_in_cell.z),
        );
        let cell = cell.as_ivec3();

        for offset in &QUADRANT_OFFSETS[..offset_count] {
            let Some(contents) = neighbourhood.grid.cell(cell + *offset * quadrant, level) else {
                continue;
            };

            for &simplex in contents {
                for &p in neighbourhood.simplices.particles(simplex as usize) {
                    let p = p as usize;
                    let (Some(fluid_pos), Some(fluid_vel)) =
                        (fluid.positions.get(p), fluid.velocities.get(p))
                    else {
                        continue;
                    };

                    let r = mode.flatten(pos - fluid_pos.truncate());
                    let d = r.length();
                    if d <= radius {
                        let w = kernel.w(d, radius);
                        sample.kernel_sum += w;
                        sample.velocity += fluid_vel.truncate() * w;
                        sample.position += fluid_pos.truncate() * w;
                        sample.count += 1;
                    }
                }
            }
        }
    }

    sample
}

#[inline]
fn quadrant_sign(v: f32) -> i32 {
    if v < 0.0 {
        -1
    } else {
        1
    }
}

/// Net acceleration on a foam particle.
///
/// Immersed foam is dragged toward the local fluid velocity, pulled toward
/// the local fluid centroid and lifted by its own buoyancy. Anything else is
/// ballistic and only feels scaled gravity.
pub fn foam_forces(
    particle: &FoamParticle,
    sample: &NeighbourSample,
    params: &SolverParams,
    dt: f32,
) -> Vec3 {
    let forces = if sample.is_immersed() {
        let pos = particle.position.truncate();
        let vel = particle.velocity.truncate();
        let inv_sum = 1.0 / sample.kernel_sum;

        let advection = particle.drag() / dt * (sample.velocity * inv_sum - vel);
        let clumping = 0.5 / dt * (sample.position * inv_sum - pos);
        let buoyancy = Vec3::new(0.0, particle.buoyancy(), 0.0);
        advection + clumping + buoyancy
    } else {
        params.gravity * params.foam_gravity_scale
    };
    params.mode.flatten(forces)
}

/// Advect surviving foam from `input` into `output`.
///
/// Each work item pops one index off the consume counter; indices outside
/// `input` and dead particles produce nothing. Survivors are appended to
/// `output` through the produce counter. The counter block is held
/// exclusively for the pass, since popping rewinds the consume side. The
/// consume count should already be clamped to the input capacity and `dt`
/// must be positive.
pub fn advect_particles<G: MultilevelLookup>(
    input: &ParticleBuffer,
    output: &mut ParticleBuffer,
    counters: &mut AtomicCounterBlock,
    neighbourhood: &Neighbourhood<G>,
    params: &SolverParams,
    dt: f32,
) -> AdvectionReport {
    let counters = &*counters;
    let output = AppendTarget::new(output, counters, AppendCursor::Produce);
    let output = &output;

    let kernel = Poly6Kernel::new(params.mode.is_2d());
    let work_items = counters.alive_count(input.capacity());
    let advect_one =
        |_: usize| advect_next(input, output, counters, neighbourhood, kernel, params, dt);

    #[cfg(feature = "parallel")]
    {
        (0..work_items)
            .into_par_iter()
            .map(advect_one)
            .reduce(AdvectionReport::default, AdvectionReport::merge)
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..work_items)
            .map(advect_one)
            .fold(AdvectionReport::default(), AdvectionReport::merge)
    }
}

fn advect_next<G: MultilevelLookup>(
    input: &ParticleBuffer,
    output: &AppendTarget,
    counters: &AtomicCounterBlock,
    neighbourhood: &Neighbourhood<G>,
    kernel: Poly6Kernel,
    params: &SolverParams,
    dt: f32,
) -> AdvectionReport {
    let index = counters.pop_consume();
    if index < 0 {
        return AdvectionReport::default();
    }
    let Some(particle) = input.get(index as usize) else {
        return AdvectionReport::default();
    };
    if !particle.is_alive() {
        return AdvectionReport::default();
    }

    let life = particle.life() - particle.decay_rate() * dt;
    if life <= 0.0 {
        return AdvectionReport {
            advected: 0,
            expired: 1,
        };
    }

    let pos = particle.position.truncate();
    let sample = sample_neighbourhood(pos, neighbourhood, kernel, params);
    let forces = foam_forces(&particle, &sample, params, dt);

    let velocity = particle.velocity.truncate() + forces * dt;
    let position = pos + velocity * dt;

    let mut attributes = particle.attributes;
    attributes.x = life;

    let written = output.push(FoamParticle {
        position: position.extend(sample.count as f32),
        velocity: velocity.extend(particle.buoyancy()),
        color: particle.color,
        attributes,
    });

    AdvectionReport {
        advected: written.is_some() as u32,
        expired: 0,
    }
}
