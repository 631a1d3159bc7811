use foam_core::{
    FluidState, FoamConfig, FoamGenerator, MultilevelGrid, ParticleBuffer, SimulationMode,
    Simplices, SolverParams,
};
use glam::{Vec2, Vec3, Vec4};
use wasm_bindgen::prelude::*;

/// Fluid arrays copied in from JS plus the neighbour grid binned from them.
///
/// The grid is only valid for the mode it was binned in, so it is rebuilt
/// on every fluid update and on every mode change.
#[derive(Default)]
struct FluidScene {
    active: Vec<u32>,
    positions: Vec<Vec4>,
    velocities: Vec<Vec4>,
    angular_velocities: Vec<Vec4>,
    principal_radii: Vec<Vec4>,
    simplices: Simplices,
    grid: MultilevelGrid,
    mode: SimulationMode,
}

impl FluidScene {
    fn state(&self) -> FluidState<'_> {
        FluidState {
            active: &self.active,
            positions: &self.positions,
            velocities: &self.velocities,
            angular_velocities: &self.angular_velocities,
            principal_radii: &self.principal_radii,
        }
    }

    /// Replace the fluid state. Every array is flat xyzw per particle.
    /// Surface elements are one point simplex per active particle.
    fn set_fluid(
        &mut self,
        active: &[u32],
        positions: &[f32],
        velocities: &[f32],
        angular_velocities: &[f32],
        principal_radii: &[f32],
    ) {
        self.active.clear();
        self.active.extend_from_slice(active);
        unpack_vec4(positions, &mut self.positions);
        unpack_vec4(velocities, &mut self.velocities);
        unpack_vec4(angular_velocities, &mut self.angular_velocities);
        unpack_vec4(principal_radii, &mut self.principal_radii);

        self.simplices = Simplices::from_points(active);
        self.rebuild_grid();
    }

    fn set_mode(&mut self, mode: SimulationMode) {
        if mode != self.mode {
            self.mode = mode;
            self.rebuild_grid();
        }
    }

    fn rebuild_grid(&mut self) {
        self.grid.build(
            &self.simplices,
            &self.positions,
            &self.principal_radii,
            self.mode,
        );
    }
}

#[wasm_bindgen]
pub struct FoamWorld {
    generator: FoamGenerator,
    params: SolverParams,
    scene: FluidScene,
}

#[wasm_bindgen]
impl FoamWorld {
    #[wasm_bindgen(constructor)]
    pub fn new(capacity: usize) -> Result<FoamWorld, JsError> {
        let config = FoamConfig {
            capacity,
            ..FoamConfig::default()
        };
        let generator = FoamGenerator::new(config).map_err(|e| JsError::new(&e.to_string()))?;

        web_sys::console::log_1(&format!("WASM FoamWorld created: capacity {}", capacity).into());

        Ok(FoamWorld {
            generator,
            params: SolverParams::default(),
            scene: FluidScene::default(),
        })
    }

    /// Advance one fixed step. Returns the elapsed wall time in ms.
    #[wasm_bindgen]
    pub fn step(&mut self, dt: f32) -> f32 {
        let start = js_sys::Date::now();
        self.generator.step(
            self.scene.state(),
            &self.scene.simplices,
            &self.scene.grid,
            &self.params,
            dt,
        );
        let elapsed = js_sys::Date::now() - start;
        elapsed as f32
    }

    /// Replace the fluid state. Every array is flat xyzw per particle;
    /// `active` lists the simulated particle ids.
    #[wasm_bindgen]
    pub fn set_fluid(
        &mut self,
        active: &[u32],
        positions: &[f32],
        velocities: &[f32],
        angular_velocities: &[f32],
        principal_radii: &[f32],
    ) {
        self.scene.set_fluid(
            active,
            positions,
            velocities,
            angular_velocities,
            principal_radii,
        );
        self.generator.resize_potentials(self.scene.positions.len());
    }

    #[wasm_bindgen]
    pub fn set_foam_config(
        &mut self,
        generation_rate: f32,
        velocity_lo: f32,
        velocity_hi: f32,
        vorticity_lo: f32,
        vorticity_hi: f32,
        lifetime: f32,
        lifetime_random: f32,
        size: f32,
        size_random: f32,
        buoyancy: f32,
        drag: f32,
    ) -> Result<(), JsError> {
        let config = FoamConfig {
            foam_generation_rate: generation_rate,
            velocity_range: Vec2::new(velocity_lo, velocity_hi),
            vorticity_range: Vec2::new(vorticity_lo, vorticity_hi),
            lifetime,
            lifetime_random,
            particle_size: size,
            size_random,
            buoyancy,
            drag,
            ..self.generator.config().clone()
        };
        self.generator
            .set_config(config)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen]
    pub fn set_foam_color(&mut self, r: f32, g: f32, b: f32, a: f32) -> Result<(), JsError> {
        let config = FoamConfig {
            foam_color: Vec4::new(r, g, b, a),
            ..self.generator.config().clone()
        };
        self.generator
            .set_config(config)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Replace the solver globals. Switching between 2D and 3D rebins the
    /// fluid grid.
    #[wasm_bindgen]
    pub fn set_solver_params(
        &mut self,
        gravity_x: f32,
        gravity_y: f32,
        gravity_z: f32,
        foam_gravity_scale: f32,
        two_d: bool,
    ) -> Result<(), JsError> {
        let params = SolverParams {
            gravity: Vec3::new(gravity_x, gravity_y, gravity_z),
            foam_gravity_scale,
            mode: if two_d {
                SimulationMode::TwoD
            } else {
                SimulationMode::ThreeD
            },
        };
        params.validate().map_err(|e| JsError::new(&e.to_string()))?;
        self.scene.set_mode(params.mode);
        self.params = params;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.generator.clear();
    }

    /// Instance count for the renderer.
    #[wasm_bindgen]
    pub fn alive_count(&self) -> usize {
        self.generator.alive_count()
    }

    /// Stable-buffer channels, read in place. Each holds xyzw per particle;
    /// the first `alive_count()` particles are live.
    #[wasm_bindgen]
    pub fn get_positions_ptr(&self) -> *const f32 {
        ParticleBuffer::as_floats(self.generator.particles().positions()).as_ptr()
    }

    #[wasm_bindgen]
    pub fn get_velocities_ptr(&self) -> *const f32 {
        ParticleBuffer::as_floats(self.generator.particles().velocities()).as_ptr()
    }

    #[wasm_bindgen]
    pub fn get_colors_ptr(&self) -> *const f32 {
        ParticleBuffer::as_floats(self.generator.particles().colors()).as_ptr()
    }

    #[wasm_bindgen]
    pub fn get_attributes_ptr(&self) -> *const f32 {
        ParticleBuffer::as_floats(self.generator.particles().attributes()).as_ptr()
    }

    /// Live floats per channel.
    #[wasm_bindgen]
    pub fn get_channel_float_length(&self) -> usize {
        self.alive_count() * 4
    }
}

fn unpack_vec4(flat: &[f32], out: &mut Vec<Vec4>) {
    out.clear();
    out.extend(flat.chunks_exact(4).map(Vec4::from_slice));
}
