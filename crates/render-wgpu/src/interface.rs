use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Module, ShaderStage, TypeInner};

use crate::error::{BindingError, ShaderError};

/// The two WGSL stage sources of a program, read from disk.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex_path: PathBuf,
    pub vertex: String,
    pub fragment_path: PathBuf,
    pub fragment: String,
}

impl ShaderSources {
    pub fn load(vertex_path: &Path, fragment_path: &Path) -> Result<Self, ShaderError> {
        Ok(Self {
            vertex: read_source(vertex_path)?,
            vertex_path: vertex_path.to_path_buf(),
            fragment: read_source(fragment_path)?,
            fragment_path: fragment_path.to_path_buf(),
        })
    }

    /// `terrain.vert.wgsl` and `terrain.frag.wgsl` inside `dir`.
    pub fn load_terrain(dir: &Path) -> Result<Self, ShaderError> {
        Self::load(&dir.join("terrain.vert.wgsl"), &dir.join("terrain.frag.wgsl"))
    }

    pub fn from_strings(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex_path: PathBuf::from("<vertex>"),
            vertex: vertex.into(),
            fragment_path: PathBuf::from("<fragment>"),
            fragment: fragment.into(),
        }
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Byte range of a member inside the uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocation {
    pub offset: u32,
    pub size: u32,
}

/// Vertex attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLocation(pub u32);

/// Reflected interface of a compiled and linked vertex/fragment pair.
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    vertex_entry: String,
    fragment_entry: String,
    uniforms: BTreeMap<String, UniformLocation>,
    uniform_block_size: u32,
    attributes: BTreeMap<String, u32>,
    output_location: u32,
}

impl ProgramInterface {
    /// Compile both stages and check that they fit together.
    ///
    /// Each stage is parsed and validated on its own (compile), then the
    /// pair must expose one vertex and one fragment entry point, agree on the
    /// uniform block at group 0 binding 0, and the fragment stage must write
    /// `output_name` at location 0 (link).
    pub fn link(sources: &ShaderSources, output_name: &str) -> Result<Self, ShaderError> {
        let vertex = compile(&sources.vertex_path, &sources.vertex)?;
        let fragment = compile(&sources.fragment_path, &sources.fragment)?;

        let vertex_entry = entry_point(&vertex, ShaderStage::Vertex)?;
        let fragment_entry = entry_point(&fragment, ShaderStage::Fragment)?;

        let mut uniforms = BTreeMap::new();
        let mut uniform_block_size = 0;
        for module in [&vertex, &fragment] {
            if let Some((members, span)) = uniform_block(module)? {
                uniform_block_size = uniform_block_size.max(span);
                for (name, location) in members {
                    match uniforms.get(&name) {
                        Some(existing) if *existing != location => {
                            return Err(link_error(format!(
                                "uniform '{name}' is laid out differently in the two stages"
                            )));
                        }
                        _ => {
                            uniforms.insert(name, location);
                        }
                    }
                }
            }
        }

        let attributes = vertex_attributes(&vertex, &vertex_entry);
        let output_location = fragment_output(&fragment, &fragment_entry, output_name)?;
        if output_location != 0 {
            return Err(link_error(format!(
                "fragment output '{output_name}' is at location {output_location}, expected 0"
            )));
        }

        tracing::debug!(
            uniforms = uniforms.len(),
            attributes = attributes.len(),
            uniform_block_size,
            "shader program linked"
        );

        Ok(Self {
            vertex_entry,
            fragment_entry,
            uniforms,
            uniform_block_size,
            attributes,
            output_location,
        })
    }

    pub fn lookup_uniform(&self, name: &str) -> Result<UniformLocation, BindingError> {
        self.uniforms
            .get(name)
            .copied()
            .ok_or_else(|| BindingError::UniformNotFound(name.to_string()))
    }

    pub fn lookup_attribute(&self, name: &str) -> Result<AttributeLocation, BindingError> {
        self.attributes
            .get(name)
            .map(|&location| AttributeLocation(location))
            .ok_or_else(|| BindingError::AttributeNotFound(name.to_string()))
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// Size of the uniform block in bytes, zero when neither stage has one.
    pub fn uniform_block_size(&self) -> u32 {
        self.uniform_block_size
    }

    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn output_location(&self) -> u32 {
        self.output_location
    }
}

fn link_error(log: String) -> ShaderError {
    ShaderError::Link { log }
}

fn compile(path: &Path, source: &str) -> Result<Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        path: path.to_path_buf(),
        log: e.emit_to_string(source),
    })?;
    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| ShaderError::Compile {
            path: path.to_path_buf(),
            log: e.emit_to_string(source),
        })?;
    Ok(module)
}

fn entry_point(module: &Module, stage: ShaderStage) -> Result<String, ShaderError> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage)
        .map(|ep| ep.name.clone())
        .ok_or_else(|| link_error(format!("no {stage:?} entry point")))
}

type UniformMembers = Vec<(String, UniformLocation)>;

fn uniform_block(module: &Module) -> Result<Option<(UniformMembers, u32)>, ShaderError> {
    let Some((_, global)) = module
        .global_variables
        .iter()
        .find(|(_, g)| g.space == AddressSpace::Uniform)
    else {
        return Ok(None);
    };

    match &global.binding {
        Some(rb) if rb.group == 0 && rb.binding == 0 => {}
        other => {
            return Err(link_error(format!(
                "uniform block must be at group 0 binding 0, found {other:?}"
            )));
        }
    }

    let TypeInner::Struct { members, span } = &module.types[global.ty].inner else {
        return Err(link_error("uniform block is not a struct".into()));
    };

    let ctx = module.to_ctx();
    let members = members
        .iter()
        .filter_map(|m| {
            let name = m.name.clone()?;
            let size = module.types[m.ty].inner.size(ctx);
            Some((
                name,
                UniformLocation {
                    offset: m.offset,
                    size,
                },
            ))
        })
        .collect();

    Ok(Some((members, *span)))
}

fn vertex_attributes(module: &Module, entry: &str) -> BTreeMap<String, u32> {
    let mut attributes = BTreeMap::new();
    let Some(ep) = module.entry_points.iter().find(|ep| ep.name == entry) else {
        return attributes;
    };

    for arg in &ep.function.arguments {
        match (&arg.binding, &arg.name) {
            (Some(Binding::Location { location, .. }), Some(name)) => {
                attributes.insert(name.clone(), *location);
            }
            (None, _) => {
                if let TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for m in members {
                        if let (Some(Binding::Location { location, .. }), Some(name)) =
                            (&m.binding, &m.name)
                        {
                            attributes.insert(name.clone(), *location);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    attributes
}

fn fragment_output(module: &Module, entry: &str, output_name: &str) -> Result<u32, ShaderError> {
    let missing = || link_error(format!("fragment stage has no output named '{output_name}'"));

    let ep = module
        .entry_points
        .iter()
        .find(|ep| ep.name == entry)
        .ok_or_else(missing)?;
    let result = ep.function.result.as_ref().ok_or_else(missing)?;

    let TypeInner::Struct { members, .. } = &module.types[result.ty].inner else {
        return Err(missing());
    };
    members
        .iter()
        .find(|m| m.name.as_deref() == Some(output_name))
        .and_then(|m| match m.binding {
            Some(Binding::Location { location, .. }) => Some(location),
            _ => None,
        })
        .ok_or_else(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
struct Uniforms {
    projection: mat4x4<f32>,
    time: f32,
    tint: vec3<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.projection * vec4<f32>(position, 1.0);
    return out;
}
"#;

    const FRAGMENT: &str = r#"
struct Uniforms {
    projection: mat4x4<f32>,
    time: f32,
    tint: vec3<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct FragmentOutput {
    @location(0) out_color: vec4<f32>,
};

@fragment
fn fs_main() -> FragmentOutput {
    var out: FragmentOutput;
    out.out_color = vec4<f32>(uniforms.tint, 1.0);
    return out;
}
"#;

    fn shader_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../shaders")
    }

    #[test]
    fn links_minimal_program() {
        let sources = ShaderSources::from_strings(VERTEX, FRAGMENT);
        let program = ProgramInterface::link(&sources, "out_color").unwrap();

        assert_eq!(program.vertex_entry(), "vs_main");
        assert_eq!(program.fragment_entry(), "fs_main");
        assert_eq!(
            program.lookup_uniform("projection"),
            Ok(UniformLocation { offset: 0, size: 64 })
        );
        assert_eq!(
            program.lookup_uniform("time"),
            Ok(UniformLocation { offset: 64, size: 4 })
        );
        assert_eq!(
            program.lookup_uniform("tint"),
            Ok(UniformLocation { offset: 80, size: 12 })
        );
        assert_eq!(program.uniform_block_size(), 96);
        assert_eq!(program.lookup_attribute("position"), Ok(AttributeLocation(0)));
        assert_eq!(program.output_location(), 0);
    }

    #[test]
    fn missing_names_are_reported() {
        let sources = ShaderSources::from_strings(VERTEX, FRAGMENT);
        let program = ProgramInterface::link(&sources, "out_color").unwrap();
        assert_eq!(
            program.lookup_uniform("fog_color"),
            Err(BindingError::UniformNotFound("fog_color".into()))
        );
        assert_eq!(
            program.lookup_attribute("normal"),
            Err(BindingError::AttributeNotFound("normal".into()))
        );
    }

    #[test]
    fn syntax_error_is_a_compile_error() {
        let broken = VERTEX.replace("return out;", "return out");
        let sources = ShaderSources::from_strings(broken, FRAGMENT);
        match ProgramInterface::link(&sources, "out_color") {
            Err(ShaderError::Compile { path, log }) => {
                assert_eq!(path, PathBuf::from("<vertex>"));
                assert!(!log.is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn type_error_is_a_compile_error() {
        let broken = FRAGMENT.replace("vec4<f32>(uniforms.tint, 1.0)", "uniforms.tint");
        let sources = ShaderSources::from_strings(VERTEX, broken);
        assert!(matches!(
            ProgramInterface::link(&sources, "out_color"),
            Err(ShaderError::Compile { .. })
        ));
    }

    #[test]
    fn wrong_output_name_fails_to_link() {
        let sources = ShaderSources::from_strings(VERTEX, FRAGMENT);
        assert!(matches!(
            ProgramInterface::link(&sources, "outColor"),
            Err(ShaderError::Link { .. })
        ));
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let sources = ShaderSources::from_strings(FRAGMENT, VERTEX);
        assert!(matches!(
            ProgramInterface::link(&sources, "out_color"),
            Err(ShaderError::Link { .. })
        ));
    }

    #[test]
    fn mismatched_uniform_blocks_fail_to_link() {
        let fragment = FRAGMENT.replacen("time: f32,", "time: vec4<f32>,", 1);
        let sources = ShaderSources::from_strings(VERTEX, fragment);
        assert!(matches!(
            ProgramInterface::link(&sources, "out_color"),
            Err(ShaderError::Link { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ShaderSources::load_terrain(Path::new("/nonexistent/shaders")).unwrap_err();
        assert!(matches!(err, ShaderError::Io { .. }));
    }

    #[test]
    fn terrain_shaders_expose_scene_interface() {
        let sources = ShaderSources::load_terrain(&shader_dir()).unwrap();
        let program = ProgramInterface::link(&sources, "out_color").unwrap();

        for name in [
            "projection",
            "model_view",
            "time",
            "debug",
            "player_position",
            "fog_color",
            "view_distance",
        ] {
            assert!(program.lookup_uniform(name).is_ok(), "{name}");
        }
        assert_eq!(program.lookup_attribute("position"), Ok(AttributeLocation(0)));
        assert_eq!(
            program.lookup_uniform("player_position"),
            Ok(UniformLocation { offset: 128, size: 12 })
        );
        assert_eq!(program.uniform_block_size(), 176);
    }
}
