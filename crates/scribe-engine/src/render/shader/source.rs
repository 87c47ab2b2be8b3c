//! Single-file shader sources.
//!
//! A shader file carries both stages, gated by preprocessor-style markers:
//!
//! ```text
//! #version 450            <- shared
//! #if VERT
//! ...vertex-only lines...
//! #elif FRAG
//! ...fragment-only lines...
//! #endif
//! ...shared...
//! ```
//!
//! Lines outside any gate go to both stages. Markers are matched as prefixes of
//! the trimmed line, case-insensitively (`#IF vert`, `#Endif` are accepted). The
//! marker lines themselves are dropped.

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Gate the splitter is currently inside.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Gate {
    None,
    Vertex,
    Fragment,
}

impl Gate {
    fn admits(self, stage: ShaderStage) -> bool {
        match self {
            Gate::None => true,
            Gate::Vertex => stage == ShaderStage::Vertex,
            Gate::Fragment => stage == ShaderStage::Fragment,
        }
    }
}

/// Per-stage sources extracted from a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSources {
    pub vertex: String,
    pub fragment: String,
}

impl StageSources {
    pub fn get(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}

/// Splits `source` into vertex and fragment sources.
///
/// Every emitted line is terminated with `\n`. Unterminated gates simply run
/// to the end of the file.
pub fn split_stages(source: &str) -> StageSources {
    let mut out = StageSources::default();
    let mut gate = Gate::None;

    for line in source.lines() {
        if let Some(next) = directive(line) {
            gate = next;
            continue;
        }
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            if gate.admits(stage) {
                let buf = match stage {
                    ShaderStage::Vertex => &mut out.vertex,
                    ShaderStage::Fragment => &mut out.fragment,
                };
                buf.push_str(line);
                buf.push('\n');
            }
        }
    }

    out
}

fn directive(line: &str) -> Option<Gate> {
    let line = line.trim_start();
    if starts_with_ignore_case(line, "#if vert") || starts_with_ignore_case(line, "#elif vert") {
        Some(Gate::Vertex)
    } else if starts_with_ignore_case(line, "#if frag")
        || starts_with_ignore_case(line, "#elif frag")
    {
        Some(Gate::Fragment)
    } else if starts_with_ignore_case(line, "#endif") {
        Some(Gate::None)
    } else {
        None
    }
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
