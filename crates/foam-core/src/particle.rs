use glam::Vec4;

/// A single foam particle as stored across the four buffer channels.
///
/// - `position.w` holds the fluid neighbour count from the last advection.
/// - `velocity.w` holds the buoyancy control value set at emission.
/// - `attributes` is `(life, 1 / initial_life, size, drag)`; `life` starts at
///   1.0 and decays to 0.0 over the particle's lifespan.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FoamParticle {
    pub position: Vec4,
    pub velocity: Vec4,
    pub color: Vec4,
    pub attributes: Vec4,
}

impl FoamParticle {
    #[inline]
    pub fn life(&self) -> f32 {
        self.attributes.x
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.attributes.x > 0.0
    }

    #[inline]
    pub fn decay_rate(&self) -> f32 {
        self.attributes.y
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.attributes.z
    }

    #[inline]
    pub fn drag(&self) -> f32 {
        self.attributes.w
    }

    #[inline]
    pub fn buoyancy(&self) -> f32 {
        self.velocity.w
    }

    #[inline]
    pub fn neighbour_count(&self) -> u32 {
        self.position.w as u32
    }
}

/// SoA foam particle storage with a capacity fixed at construction.
///
/// The channels are boxed slices, never resized. Writers check every index
/// against `capacity()` and drop out-of-range writes.
pub struct ParticleBuffer {
    pub(crate) positions: Box<[Vec4]>,
    pub(crate) velocities: Box<[Vec4]>,
    pub(crate) colors: Box<[Vec4]>,
    pub(crate) attributes: Box<[Vec4]>,
}

impl ParticleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: vec![Vec4::ZERO; capacity].into_boxed_slice(),
            velocities: vec![Vec4::ZERO; capacity].into_boxed_slice(),
            colors: vec![Vec4::ZERO; capacity].into_boxed_slice(),
            attributes: vec![Vec4::ZERO; capacity].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec4] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec4] {
        &self.velocities
    }

    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    pub fn attributes(&self) -> &[Vec4] {
        &self.attributes
    }

    /// Flat `f32` view of a channel, for upload to a renderer.
    pub fn as_floats(channel: &[Vec4]) -> &[f32] {
        bytemuck::cast_slice(channel)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<FoamParticle> {
        if index >= self.capacity() {
            return None;
        }
        Some(FoamParticle {
            position: self.positions[index],
            velocity: self.velocities[index],
            color: self.colors[index],
            attributes: self.attributes[index],
        })
    }

    /// Write a particle; out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, particle: FoamParticle) -> bool {
        if index >= self.capacity() {
            return false;
        }
        self.positions[index] = particle.position;
        self.velocities[index] = particle.velocity;
        self.colors[index] = particle.color;
        self.attributes[index] = particle.attributes;
        true
    }

    /// Zero every slot.
    pub fn clear(&mut self) {
        self.positions.fill(Vec4::ZERO);
        self.velocities.fill(Vec4::ZERO);
        self.colors.fill(Vec4::ZERO);
        self.attributes.fill(Vec4::ZERO);
    }
}

/// Read-only view of the carrier fluid, borrowed from the solver each step.
///
/// All per-particle arrays are indexed by solver particle id. `active`
/// lists the ids currently simulated; ids past the end of an array are
/// skipped by every stage.
#[derive(Clone, Copy)]
pub struct FluidState<'a> {
    pub active: &'a [u32],
    pub positions: &'a [Vec4],
    pub velocities: &'a [Vec4],
    pub angular_velocities: &'a [Vec4],
    pub principal_radii: &'a [Vec4],
}

impl<'a> FluidState<'a> {
    /// Number of particle ids covered by every per-particle array.
    pub fn particle_count(&self) -> usize {
        self.positions
            .len()
            .min(self.velocities.len())
            .min(self.angular_velocities.len())
            .min(self.principal_radii.len())
    }
}
