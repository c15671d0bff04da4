//! Lighting system
//!
//! A fixed table of [`MAX_LIGHTS`] slots plus a global ambient term, uploaded
//! as one constant buffer ([`LightsRaw`]).

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{utils, Vec3, Vec4};

/// Number of light slots
pub const MAX_LIGHTS: usize = 16;

/// Light types, numbered as the shaders expect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum LightType {
    /// Omni light with range and attenuation
    Point = 1,
    /// Cone light with falloff between `theta` and `phi`
    Spot = 2,
    /// Infinite light (direction only)
    Directional = 3,
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Whether the slot contributes
    pub enabled: bool,
    /// Light type
    pub light_type: LightType,
    /// Ambient color
    pub ambient: Vec4,
    /// Diffuse color
    pub diffuse: Vec4,
    /// Specular color
    pub specular: Vec4,
    /// Position (point/spot)
    pub position: Vec3,
    /// Direction (spot/directional), normalized
    pub direction: Vec3,
    /// Constant/linear/quadratic attenuation
    pub attenuation: Vec3,
    /// Spot falloff exponent
    pub falloff: f32,
    /// Cosine of the inner cone angle
    pub theta: f32,
    /// Cosine of the outer cone angle
    pub phi: f32,
    /// Range (point/spot)
    pub range: f32,
}

impl Light {
    /// Create a directional light
    pub fn directional(direction: Vec3, ambient: Vec4, diffuse: Vec4, specular: Vec4) -> Self {
        Self {
            enabled: true,
            light_type: LightType::Directional,
            ambient,
            diffuse,
            specular,
            position: Vec3::zeros(),
            direction: utils::normalize_or(direction, Vec3::z()),
            attenuation: Vec3::new(1.0, 0.0, 0.0),
            falloff: 0.0,
            theta: 0.0,
            phi: 0.0,
            range: 0.0,
        }
    }

    /// Create a point light
    pub fn point(position: Vec3, range: f32, attenuation: Vec3, ambient: Vec4, diffuse: Vec4, specular: Vec4) -> Self {
        Self {
            enabled: true,
            light_type: LightType::Point,
            ambient,
            diffuse,
            specular,
            position,
            direction: Vec3::zeros(),
            attenuation,
            falloff: 0.0,
            theta: 0.0,
            phi: 0.0,
            range,
        }
    }

    /// Create a spot light; cone angles are in degrees
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        range: f32,
        attenuation: Vec3,
        falloff: f32,
        inner_degrees: f32,
        outer_degrees: f32,
        ambient: Vec4,
        diffuse: Vec4,
        specular: Vec4,
    ) -> Self {
        Self {
            enabled: true,
            light_type: LightType::Spot,
            ambient,
            diffuse,
            specular,
            position,
            direction: utils::normalize_or(direction, Vec3::z()),
            attenuation,
            falloff,
            theta: utils::deg_to_rad(inner_degrees).cos(),
            phi: utils::deg_to_rad(outer_degrees).cos(),
            range,
        }
    }

    /// A disabled slot
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::directional(Vec3::z(), Vec4::zeros(), Vec4::zeros(), Vec4::zeros())
        }
    }

    fn to_raw(&self) -> LightRaw {
        LightRaw {
            ambient: self.ambient.into(),
            diffuse: self.diffuse.into(),
            specular: self.specular.into(),
            position: self.position.into(),
            falloff: self.falloff,
            direction: self.direction.into(),
            theta: self.theta,
            attenuation: self.attenuation.into(),
            phi: self.phi,
            range: self.range,
            padding: 0.0,
            enabled: i32::from(self.enabled),
            light_type: self.light_type as i32,
        }
    }
}

/// Shader layout of one light
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightRaw {
    /// Ambient color
    pub ambient: [f32; 4],
    /// Diffuse color
    pub diffuse: [f32; 4],
    /// Specular color
    pub specular: [f32; 4],
    /// Position
    pub position: [f32; 3],
    /// Spot falloff
    pub falloff: f32,
    /// Direction
    pub direction: [f32; 3],
    /// Cos inner cone
    pub theta: f32,
    /// Attenuation
    pub attenuation: [f32; 3],
    /// Cos outer cone
    pub phi: f32,
    /// Range
    pub range: f32,
    /// Unused
    pub padding: f32,
    /// 1 when enabled
    pub enabled: i32,
    /// [`LightType`] discriminant
    pub light_type: i32,
}

/// Shader layout of the whole light table
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightsRaw {
    /// All slots, disabled ones included
    pub lights: [LightRaw; MAX_LIGHTS],
    /// Global ambient color
    pub global_ambient: [f32; 4],
}

/// The scene's light table
#[derive(Debug, Clone)]
pub struct Lights {
    lights: Vec<Light>,
    /// Global ambient color
    pub global_ambient: Vec4,
}

impl Default for Lights {
    fn default() -> Self {
        Self::new()
    }
}

impl Lights {
    /// All slots disabled, black ambient
    pub fn new() -> Self {
        Self {
            lights: vec![Light::disabled(); MAX_LIGHTS],
            global_ambient: Vec4::zeros(),
        }
    }

    /// Put `light` in `slot`; out-of-range slots are ignored and reported
    pub fn set(&mut self, slot: usize, light: Light) -> bool {
        match self.lights.get_mut(slot) {
            Some(existing) => {
                *existing = light;
                true
            }
            None => {
                log::warn!("Light slot {slot} out of range (max {MAX_LIGHTS})");
                false
            }
        }
    }

    /// Borrow a slot
    pub fn get(&self, slot: usize) -> Option<&Light> {
        self.lights.get(slot)
    }

    /// Mutably borrow a slot
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Light> {
        self.lights.get_mut(slot)
    }

    /// Number of enabled slots
    pub fn enabled_count(&self) -> usize {
        self.lights.iter().filter(|l| l.enabled).count()
    }

    /// Constant-buffer image of the table
    pub fn to_raw(&self) -> LightsRaw {
        let mut raw = LightsRaw::zeroed();
        for (dst, light) in raw.lights.iter_mut().zip(&self.lights) {
            *dst = light.to_raw();
        }
        raw.global_ambient = self.global_ambient.into();
        raw
    }
}
