#[cfg(feature = "parallel")]
use rayon::prelude::*;

use glam::{Vec3, Vec4};

use crate::config::{FoamConfig, SimulationMode};
use crate::counters::{AppendTarget, EmitPotentials};
use crate::math::{hash13, random_in_cylinder, remap01};
use crate::particle::{FluidState, FoamParticle};

/// Input offset for the size hash, decorrelating size from lifetime.
const SIZE_HASH_OFFSET: Vec3 = Vec3::new(0.51, 0.23, 0.1);

/// Foam potentials of one fluid particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Potential {
    pub velocity: f32,
    pub vorticity: f32,
}

impl Potential {
    /// Velocity potential times vorticity potential, in [0,1].
    #[inline]
    pub fn total(&self) -> f32 {
        self.velocity * self.vorticity
    }
}

/// Compute how foam-prone a fluid particle is from its speed and spin.
#[inline]
pub fn potential(velocity: Vec4, angular_velocity: Vec4, config: &FoamConfig) -> Potential {
    let vr = config.velocity_range;
    let wr = config.vorticity_range;
    Potential {
        velocity: remap01(velocity.truncate().length(), vr.x, vr.y),
        vorticity: remap01(angular_velocity.truncate().length(), wr.x, wr.y),
    }
}

/// Add `amount` to a potential and split off the whole particles.
///
/// Returns `(emit_count, remainder)` with `remainder` in [0,1).
#[inline]
pub fn accumulate(current: f32, amount: f32) -> (u32, f32) {
    let total = (current + amount).max(0.0);
    let count = total.floor();
    let remainder = total - count;
    if remainder >= 1.0 {
        // float rounding at the top of the interval
        (count as u32 + 1, 0.0)
    } else {
        (count as u32, remainder)
    }
}

/// Spawn foam at fluid particles with enough velocity and vorticity.
///
/// Each active fluid particle accumulates `potential * rate * dt` into its
/// emit potential; every whole unit spawns one particle appended to
/// `output`. Slots past the output capacity are dropped. Returns the number
/// of emission requests, including dropped ones.
pub fn emit_particles(
    fluid: &FluidState,
    potentials: &EmitPotentials,
    output: &AppendTarget,
    config: &FoamConfig,
    mode: SimulationMode,
    dt: f32,
) -> u32 {
    let emit_one =
        |&p: &u32| emit_from(p as usize, fluid, potentials, output, config, mode, dt);

    #[cfg(feature = "parallel")]
    {
        fluid.active.par_iter().map(emit_one).sum()
    }

    #[cfg(not(feature = "parallel"))]
    {
        fluid.active.iter().map(emit_one).sum()
    }
}

fn emit_from(
    p: usize,
    fluid: &FluidState,
    potentials: &EmitPotentials,
    output: &AppendTarget,
    config: &FoamConfig,
    mode: SimulationMode,
    dt: f32,
) -> u32 {
    if p >= fluid.particle_count() {
        return 0;
    }
    let Some(current) = potentials.get(p) else {
        return 0;
    };

    let velocity = fluid.velocities[p];
    let pot = potential(velocity, fluid.angular_velocities[p], config);
    let (emit_count, remainder) =
        accumulate(current, pot.total() * config.foam_generation_rate * dt);
    potentials.set(p, remainder);

    if emit_count == 0 {
        return 0;
    }

    let position = fluid.positions[p].truncate();
    let predicted = position + velocity.truncate() * dt;
    let radius = fluid.principal_radii[p].x;

    let lifetime = config.lifetime;
    let initial_life = pot.velocity
        * (lifetime - hash13(position) * lifetime * config.lifetime_random);
    let size = config.particle_size;
    let initial_size =
        size - hash13(position + SIZE_HASH_OFFSET) * size * config.size_random;

    for j in 0..emit_count {
        let Some(slot) = output.reserve() else {
            continue;
        };

        let (sample, offset) = random_in_cylinder(j as f32, position, predicted, radius);
        let offset = mode.flatten(offset);
        let sample = if mode.is_2d() {
            // keep the fluid particle's own depth, drop only the sampled spread
            Vec3::new(sample.x, sample.y, position.z)
        } else {
            sample
        };

        slot.write(FoamParticle {
            position: sample.extend(0.0),
            velocity: velocity + offset.extend(config.buoyancy),
            color: config.foam_color,
            attributes: Vec4::new(1.0, 1.0 / initial_life, initial_size, config.drag),
        });
    }

    emit_count
}
