//! Shader programs: single-file sources, reflection, and the program registry.

mod reflect;
mod registry;
mod source;

pub use reflect::{AttributeLocations, ProgramLayout};
pub use registry::{ProgramId, ShaderProgram, ShaderRegistry};
pub use source::{split_stages, ShaderStage, StageSources};

use std::fmt;

/// Compile or link failure.
///
/// All three logs are captured regardless of which step failed; empty logs
/// mean that step reported nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderError {
    pub label: String,
    pub vertex_log: String,
    pub fragment_log: String,
    pub program_log: String,
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "shader program '{}' failed to link", self.label)?;
        writeln!(f, "vertex: {}", or_none(&self.vertex_log))?;
        writeln!(f, "fragment: {}", or_none(&self.fragment_log))?;
        write!(f, "program: {}", or_none(&self.program_log))
    }
}

impl std::error::Error for ShaderError {}

fn or_none(log: &str) -> &str {
    if log.trim().is_empty() { "(no output)" } else { log.trim_end() }
}
