use glam::{Mat4, Vec3};

use crate::interface::{ProgramInterface, UniformLocation};

/// CPU copy of the uniform buffer, written member by member at reflected
/// offsets and uploaded whole.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(size: u32) -> Self {
        Self {
            bytes: vec![0; size as usize],
        }
    }

    /// Write `value` at `location`. An absent location is skipped, as is a
    /// value whose size does not match the member.
    pub fn write(&mut self, location: Option<UniformLocation>, value: &[u8]) {
        let Some(location) = location else {
            return;
        };
        let start = location.offset as usize;
        let end = start + value.len();
        if value.len() != location.size as usize || end > self.bytes.len() {
            tracing::warn!(
                offset = location.offset,
                expected = location.size,
                got = value.len(),
                "uniform write does not match the shader layout, skipped"
            );
            return;
        }
        self.bytes[start..end].copy_from_slice(value);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Values the terrain program reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneUniforms {
    pub projection: Mat4,
    pub model_view: Mat4,
    pub time: f32,
    pub debug: bool,
    pub player_position: Vec3,
    pub fog_color: Vec3,
    pub view_distance: f32,
}

impl Default for SceneUniforms {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            model_view: Mat4::IDENTITY,
            time: 0.0,
            debug: false,
            player_position: Vec3::ZERO,
            fog_color: Vec3::new(225.0, 240.0, 245.0) / 255.0,
            view_distance: 750.0,
        }
    }
}

/// Uniform locations resolved against one linked program. Missing ones
/// are `None` and their writes are skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneBindings {
    pub projection: Option<UniformLocation>,
    pub model_view: Option<UniformLocation>,
    pub time: Option<UniformLocation>,
    pub debug: Option<UniformLocation>,
    pub player_position: Option<UniformLocation>,
    pub fog_color: Option<UniformLocation>,
    pub view_distance: Option<UniformLocation>,
}

impl SceneBindings {
    pub fn resolve(program: &ProgramInterface) -> Self {
        let lookup = |name: &str| match program.lookup_uniform(name) {
            Ok(location) => Some(location),
            Err(e) => {
                tracing::warn!("{e}");
                None
            }
        };
        Self {
            projection: lookup("projection"),
            model_view: lookup("model_view"),
            time: lookup("time"),
            debug: lookup("debug"),
            player_position: lookup("player_position"),
            fog_color: lookup("fog_color"),
            view_distance: lookup("view_distance"),
        }
    }

    pub fn write(&self, block: &mut UniformBlock, scene: &SceneUniforms) {
        block.write(
            self.projection,
            bytemuck::bytes_of(&scene.projection.to_cols_array()),
        );
        block.write(
            self.model_view,
            bytemuck::bytes_of(&scene.model_view.to_cols_array()),
        );
        block.write(self.time, bytemuck::bytes_of(&scene.time));
        block.write(self.debug, bytemuck::bytes_of(&u32::from(scene.debug)));
        block.write(
            self.player_position,
            bytemuck::bytes_of(&scene.player_position.to_array()),
        );
        block.write(
            self.fog_color,
            bytemuck::bytes_of(&scene.fog_color.to_array()),
        );
        block.write(self.view_distance, bytemuck::bytes_of(&scene.view_distance));
    }
}
