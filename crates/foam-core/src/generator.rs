use crate::advection::{advect_particles, Neighbourhood};
use crate::compaction::compact;
use crate::config::{FoamConfig, SolverParams};
use crate::counters::{AppendCursor, AppendTarget, AtomicCounterBlock, EmitPotentials};
use crate::emission::emit_particles;
use crate::error::FoamResult;
use crate::grid::{MultilevelLookup, Simplices};
use crate::particle::{FluidState, ParticleBuffer};

/// Summary of one pipeline step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Particles the emission stage asked for, including dropped ones.
    pub emission_requests: u32,
    /// Emission requests that found the buffer full.
    pub dropped: u32,
    /// Particles whose life ran out this step.
    pub expired: u32,
    /// Particles in the stable buffer after the step.
    pub alive: usize,
}

/// Secondary foam particle system driven by a fluid solver.
///
/// Owns the per-fluid-particle emit potentials, the stable and advected
/// particle buffers, and the counter block. Each [`step`](Self::step) runs
/// emission, advection and compaction in that order.
pub struct FoamGenerator {
    config: FoamConfig,
    potentials: EmitPotentials,
    stable: ParticleBuffer,
    advected: ParticleBuffer,
    counters: AtomicCounterBlock,
}

impl FoamGenerator {
    pub fn new(config: FoamConfig) -> FoamResult<Self> {
        if let Err(e) = config.validate() {
            log::warn!("rejected foam config: {e}");
            return Err(e);
        }
        log::info!("foam generator created: capacity {}", config.capacity);

        Ok(Self {
            potentials: EmitPotentials::default(),
            stable: ParticleBuffer::new(config.capacity),
            advected: ParticleBuffer::new(config.capacity),
            counters: AtomicCounterBlock::new(),
            config,
        })
    }

    pub fn config(&self) -> &FoamConfig {
        &self.config
    }

    /// Replace the configuration. A capacity change reallocates both buffers
    /// and discards every live particle.
    pub fn set_config(&mut self, config: FoamConfig) -> FoamResult<()> {
        if let Err(e) = config.validate() {
            log::warn!("rejected foam config: {e}");
            return Err(e);
        }
        if config.capacity != self.config.capacity {
            log::info!(
                "foam capacity {} -> {}, clearing particles",
                self.config.capacity,
                config.capacity
            );
            self.stable = ParticleBuffer::new(config.capacity);
            self.advected = ParticleBuffer::new(config.capacity);
            self.counters.reset();
        }
        self.config = config;
        Ok(())
    }

    /// Resize the emit potentials to the fluid particle count. New entries
    /// start at zero.
    pub fn resize_potentials(&mut self, fluid_particle_count: usize) {
        if fluid_particle_count != self.potentials.len() {
            log::debug!(
                "emit potentials {} -> {}",
                self.potentials.len(),
                fluid_particle_count
            );
            self.potentials.resize(fluid_particle_count);
        }
    }

    pub fn potentials(&self) -> &EmitPotentials {
        &self.potentials
    }

    /// The stable buffer: the renderer's input and the next step's carryover.
    pub fn particles(&self) -> &ParticleBuffer {
        &self.stable
    }

    pub fn alive_count(&self) -> usize {
        self.counters.alive_count(self.stable.capacity())
    }

    pub fn counters(&self) -> &AtomicCounterBlock {
        &self.counters
    }

    /// Drop every particle and zero the emit potentials.
    pub fn clear(&mut self) {
        self.stable.clear();
        self.advected.clear();
        self.counters.reset();
        self.potentials.reset();
    }

    /// Advance the foam by one fixed step of `dt` seconds.
    ///
    /// The emit potentials grow automatically if the fluid has more
    /// particles than they cover. A non-positive or non-finite `dt` leaves
    /// everything untouched.
    pub fn step<G: MultilevelLookup>(
        &mut self,
        fluid: FluidState,
        simplices: &Simplices,
        grid: &G,
        params: &SolverParams,
        dt: f32,
    ) -> StepReport {
        if !(dt > 0.0 && dt.is_finite()) {
            return StepReport {
                alive: self.alive_count(),
                ..StepReport::default()
            };
        }

        let fluid_count = fluid.particle_count();
        if fluid_count > self.potentials.len() {
            self.resize_potentials(fluid_count);
        }

        let capacity = self.stable.capacity();

        // 1. Emission appends to the stable buffer.
        let emission_requests = {
            let target =
                AppendTarget::new(&mut self.stable, &self.counters, AppendCursor::Consume);
            emit_particles(&fluid, &self.potentials, &target, &self.config, params.mode, dt)
        };
        let dropped = (self.counters.consume() as i64 - capacity as i64).max(0) as u32;
        if dropped > 0 {
            log::debug!("foam buffer full: dropped {dropped} of {emission_requests} emissions");
        }
        self.counters.clamp_consume(capacity);

        // 2. Advection pops the stable buffer into the advected buffer.
        let neighbourhood = Neighbourhood {
            fluid,
            simplices,
            grid,
        };
        let advection = advect_particles(
            &self.stable,
            &mut self.advected,
            &mut self.counters,
            &neighbourhood,
            params,
            dt,
        );

        // 3. Compaction copies back and rolls the counters.
        compact(&self.advected, &mut self.stable, &mut self.counters);

        let report = StepReport {
            emission_requests,
            dropped,
            expired: advection.expired,
            alive: self.alive_count(),
        };
        log::trace!("foam step: {report:?}");
        report
    }
}
