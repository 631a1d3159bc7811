use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FoamResult};

/// Dimensionality of the carrier fluid simulation.
///
/// In `TwoD` mode the z axis is zeroed throughout: cell coordinates,
/// neighbour distances, emission offsets and forces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationMode {
    #[default]
    ThreeD,
    TwoD,
}

impl SimulationMode {
    #[inline]
    pub fn is_2d(self) -> bool {
        self == SimulationMode::TwoD
    }

    /// Zero the z component in 2D mode.
    #[inline]
    pub fn flatten(self, v: Vec3) -> Vec3 {
        match self {
            SimulationMode::ThreeD => v,
            SimulationMode::TwoD => Vec3::new(v.x, v.y, 0.0),
        }
    }
}

/// Global parameters published by the fluid solver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    pub gravity: Vec3,
    /// Multiplier applied to gravity for ballistic foam.
    pub foam_gravity_scale: f32,
    pub mode: SimulationMode,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            foam_gravity_scale: 1.0,
            mode: SimulationMode::ThreeD,
        }
    }
}

impl SolverParams {
    pub fn validate(&self) -> FoamResult<()> {
        if !self.gravity.is_finite() {
            return Err(ConfigError::NonFinite("gravity"));
        }
        if !self.foam_gravity_scale.is_finite() {
            return Err(ConfigError::NonFinite("foam_gravity_scale"));
        }
        Ok(())
    }
}

/// Foam generator parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoamConfig {
    /// Particles emitted per second by a fluid particle at full potential.
    pub foam_generation_rate: f32,
    /// Fluid speed remapped to the velocity potential (`x` = lo, `y` = hi).
    pub velocity_range: Vec2,
    /// Fluid angular speed remapped to the vorticity potential.
    pub vorticity_range: Vec2,
    /// Base lifespan in seconds.
    pub lifetime: f32,
    /// Fraction of `lifetime` that may be randomly removed, in [0,1].
    pub lifetime_random: f32,
    pub particle_size: f32,
    /// Fraction of `particle_size` that may be randomly removed, in [0,1].
    pub size_random: f32,
    /// Upward acceleration applied to immersed foam.
    pub buoyancy: f32,
    /// How strongly immersed foam follows the fluid velocity, in [0,1].
    pub drag: f32,
    pub foam_color: Vec4,
    /// Fixed size of both particle buffers.
    pub capacity: usize,
}

impl Default for FoamConfig {
    fn default() -> Self {
        Self {
            foam_generation_rate: 250.0,
            velocity_range: Vec2::new(2.0, 4.0),
            vorticity_range: Vec2::new(4.0, 8.0),
            lifetime: 5.0,
            lifetime_random: 0.2,
            particle_size: 0.02,
            size_random: 0.2,
            buoyancy: 10.0,
            drag: 0.5,
            foam_color: Vec4::new(1.0, 1.0, 1.0, 0.25),
            capacity: 65536,
        }
    }
}

impl FoamConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> FoamResult<()> {
        check_range("velocity_range", self.velocity_range)?;
        check_range("vorticity_range", self.vorticity_range)?;

        if self.capacity == 0 || self.capacity > i32::MAX as usize {
            return Err(ConfigError::InvalidCapacity(self.capacity));
        }

        check_finite("foam_generation_rate", self.foam_generation_rate)?;
        if self.foam_generation_rate < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "foam_generation_rate",
                value: self.foam_generation_rate,
                expected: ">= 0",
            });
        }

        check_finite("lifetime", self.lifetime)?;
        if self.lifetime <= 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "lifetime",
                value: self.lifetime,
                expected: "> 0",
            });
        }

        check_finite("particle_size", self.particle_size)?;
        if self.particle_size <= 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "particle_size",
                value: self.particle_size,
                expected: "> 0",
            });
        }

        check_unit("lifetime_random", self.lifetime_random)?;
        check_unit("size_random", self.size_random)?;
        check_unit("drag", self.drag)?;

        check_finite("buoyancy", self.buoyancy)?;
        if !self.foam_color.is_finite() {
            return Err(ConfigError::NonFinite("foam_color"));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> FoamResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> FoamResult<String> {
        toml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

fn check_range(name: &'static str, range: Vec2) -> FoamResult<()> {
    if !range.is_finite() {
        return Err(ConfigError::NonFinite(name));
    }
    if range.x < 0.0 || range.y <= range.x {
        return Err(ConfigError::InvalidRange {
            name,
            lo: range.x,
            hi: range.y,
        });
    }
    Ok(())
}

fn check_finite(name: &'static str, value: f32) -> FoamResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite(name))
    }
}

fn check_unit(name: &'static str, value: f32) -> FoamResult<()> {
    check_finite(name, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            expected: "[0, 1]",
        });
    }
    Ok(())
}
