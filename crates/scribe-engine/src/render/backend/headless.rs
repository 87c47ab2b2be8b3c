use crate::paint::Color;
use crate::render::shader::ShaderError;
use crate::render::transform::TransformUniform;
use crate::render::vertex::Vertex;

use super::{DrawCall, ProgramDesc, ProgramHandle, RenderBackend, TextureDesc, TextureHandle};

/// Texture side reported by [`HeadlessBackend::max_texture_dimension`].
/// Matches wgpu's default `max_texture_dimension_2d`.
const HEADLESS_MAX_TEXTURE_DIMENSION: u32 = 8192;

#[derive(Debug, Clone)]
pub struct RecordedProgram {
    pub label: String,
    pub vertex_source: String,
    pub fragment_source: String,
}

#[derive(Debug, Clone)]
pub struct RecordedTexture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// Number of non-zero texels.
    pub coverage: usize,
}

#[derive(Debug, Clone)]
pub struct RecordedDraw {
    pub program: ProgramHandle,
    pub texture: Option<TextureHandle>,
    pub vertices: Vec<Vertex>,
}

/// Backend that renders nothing and records everything.
///
/// Used for tests and for driving the core without a window. A shader stage
/// containing a `#error` line fails to compile, with the rest of that line as
/// its log, which is how GLSL compilers treat the directive.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    programs: Vec<RecordedProgram>,
    textures: Vec<RecordedTexture>,
    draws: Vec<RecordedDraw>,
    transforms: Vec<(ProgramHandle, TransformUniform)>,
    clears: Vec<Color>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn programs(&self) -> &[RecordedProgram] {
        &self.programs
    }

    pub fn textures(&self) -> &[RecordedTexture] {
        &self.textures
    }

    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn transforms(&self) -> &[(ProgramHandle, TransformUniform)] {
        &self.transforms
    }

    pub fn clears(&self) -> &[Color] {
        &self.clears
    }

    /// Forgets recorded draws, transforms and clears; programs and textures stay.
    pub fn clear_recording(&mut self) {
        self.draws.clear();
        self.transforms.clear();
        self.clears.clear();
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, ShaderError> {
        let vertex_log = error_directives(desc.vertex_source);
        let fragment_log = error_directives(desc.fragment_source);
        if !vertex_log.is_empty() || !fragment_log.is_empty() {
            return Err(ShaderError {
                label: desc.label.to_string(),
                vertex_log,
                fragment_log,
                program_log: "link skipped: a stage failed to compile".to_string(),
            });
        }

        self.programs.push(RecordedProgram {
            label: desc.label.to_string(),
            vertex_source: desc.vertex_source.to_string(),
            fragment_source: desc.fragment_source.to_string(),
        });
        Ok(ProgramHandle(self.programs.len() as u32 - 1))
    }

    fn create_texture_r8(&mut self, desc: &TextureDesc<'_>) -> TextureHandle {
        debug_assert_eq!(desc.pixels.len(), (desc.width * desc.height) as usize);
        self.textures.push(RecordedTexture {
            label: desc.label.to_string(),
            width: desc.width,
            height: desc.height,
            coverage: desc.pixels.iter().filter(|&&p| p != 0).count(),
        });
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn max_texture_dimension(&self) -> u32 {
        HEADLESS_MAX_TEXTURE_DIMENSION
    }

    fn set_transform(&mut self, program: ProgramHandle, transform: &TransformUniform) {
        self.transforms.push((program, *transform));
    }

    fn clear(&mut self, color: Color) {
        self.clears.push(color);
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        self.draws.push(RecordedDraw {
            program: call.program,
            texture: call.texture,
            vertices: call.vertices.to_vec(),
        });
    }
}

fn error_directives(source: &str) -> String {
    source
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("#error"))
        .map(|msg| format!("error: {}\n", msg.trim()))
        .collect()
}
