use std::path::Path;

use anyhow::Context;

use crate::render::backend::{ProgramDesc, ProgramHandle, RenderBackend};

use super::{split_stages, ProgramLayout, ShaderError};

/// Index of a program inside a [`ShaderRegistry`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(usize);

/// A linked program and the interface reflected from its source.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub label: String,
    pub handle: ProgramHandle,
    pub layout: ProgramLayout,
}

/// Owns every loaded program and tracks which one is bound.
///
/// Binding is plain state: transform refreshes and batch flushes both read
/// [`current`](Self::current).
#[derive(Debug, Default)]
pub struct ShaderRegistry {
    programs: Vec<ShaderProgram>,
    current: Option<ProgramId>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits, reflects, compiles and links a single-file shader.
    ///
    /// On failure the three logs are written to the `error` log before the
    /// error is returned.
    pub fn load<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        label: &str,
        source: &str,
    ) -> Result<ProgramId, ShaderError> {
        let stages = split_stages(source);
        let layout = ProgramLayout::reflect(&stages.vertex, &stages.fragment);

        let handle = backend
            .create_program(&ProgramDesc {
                label,
                vertex_source: &stages.vertex,
                fragment_source: &stages.fragment,
                layout: &layout,
            })
            .inspect_err(|err| {
                log::error!("shader '{label}' vertex log:\n{}", err.vertex_log);
                log::error!("shader '{label}' fragment log:\n{}", err.fragment_log);
                log::error!("shader '{label}' program log:\n{}", err.program_log);
            })?;

        log::debug!("shader '{label}' linked: {layout:?}");

        let id = ProgramId(self.programs.len());
        self.programs.push(ShaderProgram {
            label: label.to_string(),
            handle,
            layout,
        });
        Ok(id)
    }

    /// Reads `path` and loads it; the file name becomes the label.
    pub fn load_from_file<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        path: impl AsRef<Path>,
    ) -> anyhow::Result<ProgramId> {
        let path = path.as_ref();
        let bytes = crate::assets::load_file_bytes(path)?;
        let source = String::from_utf8(bytes)
            .with_context(|| format!("shader source is not UTF-8: {}", path.display()))?;
        let label = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        Ok(self.load(backend, &label, &source)?)
    }

    /// Makes `id` the current program.
    pub fn bind(&mut self, id: ProgramId) {
        debug_assert!(id.0 < self.programs.len(), "ProgramId from another registry");
        self.current = Some(id);
    }

    #[inline]
    pub fn current(&self) -> Option<ProgramId> {
        self.current
    }

    #[inline]
    pub fn current_program(&self) -> Option<&ShaderProgram> {
        self.current.and_then(|id| self.programs.get(id.0))
    }

    #[inline]
    pub fn get(&self, id: ProgramId) -> Option<&ShaderProgram> {
        self.programs.get(id.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
