//! Source-level reflection of the names the batcher binds by.
//!
//! The immediate-mode pipelines agree on a small vocabulary:
//!
//! | name                 | kind      | stage    |
//! |----------------------|-----------|----------|
//! | `position`           | attribute | vertex   |
//! | `color`              | attribute | vertex   |
//! | `uv`                 | attribute | vertex   |
//! | `world_to_view`      | uniform   | vertex   |
//! | `view_to_projection` | uniform   | vertex   |
//! | `ftex`               | texture   | fragment |
//!
//! Any of them may be absent: a solid-color program has no `uv` and no `ftex`.

pub const POSITION_ATTRIBUTE: &str = "position";
pub const COLOR_ATTRIBUTE: &str = "color";
pub const UV_ATTRIBUTE: &str = "uv";
pub const WORLD_TO_VIEW_UNIFORM: &str = "world_to_view";
pub const VIEW_TO_PROJECTION_UNIFORM: &str = "view_to_projection";
pub const TEXTURE_UNIFORM: &str = "ftex";

/// Vertex input locations, `None` when the program does not consume the attribute.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AttributeLocations {
    pub position: Option<u32>,
    pub color: Option<u32>,
    pub uv: Option<u32>,
}

/// Bindable interface of a linked program.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ProgramLayout {
    pub attributes: AttributeLocations,
    /// Both transform matrices are declared.
    pub has_transform: bool,
    /// The fragment stage samples `ftex`.
    pub has_texture: bool,
}

impl ProgramLayout {
    pub fn reflect(vertex_source: &str, fragment_source: &str) -> Self {
        let mut attributes = AttributeLocations::default();
        for (location, name) in vertex_source.lines().filter_map(parse_input_declaration) {
            match name {
                POSITION_ATTRIBUTE => attributes.position = Some(location),
                COLOR_ATTRIBUTE => attributes.color = Some(location),
                UV_ATTRIBUTE => attributes.uv = Some(location),
                _ => {}
            }
        }

        Self {
            attributes,
            has_transform: declares(vertex_source, WORLD_TO_VIEW_UNIFORM)
                && declares(vertex_source, VIEW_TO_PROJECTION_UNIFORM),
            has_texture: declares(fragment_source, TEXTURE_UNIFORM),
        }
    }
}

/// Parses `layout(location = N) in <type> <name>;`.
fn parse_input_declaration(line: &str) -> Option<(u32, &str)> {
    let line = line.trim();
    let rest = line.strip_prefix("layout")?.trim_start();
    let rest = rest.strip_prefix('(')?;
    let (qualifiers, decl) = rest.split_once(')')?;

    let location = qualifiers.split(',').find_map(|q| {
        let (key, value) = q.split_once('=')?;
        if key.trim() != "location" {
            return None;
        }
        value.trim().parse::<u32>().ok()
    })?;

    let mut tokens = decl.split_whitespace();
    if tokens.next()? != "in" {
        return None;
    }
    let _ty = tokens.next()?;
    let name = tokens.next()?.trim_end_matches(';');
    Some((location, name))
}

/// Whole-identifier search, ignoring `//` line comments.
fn declares(source: &str, ident: &str) -> bool {
    source.lines().any(|line| {
        let code = line.split("//").next().unwrap_or_default();
        code.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .any(|token| token == ident)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTURED_VS: &str = "\
layout(location = 0) in vec2 position;
layout(location = 1) in vec4 color;
layout (location=2) in vec2 uv;
layout(set = 0, binding = 0) uniform Transform {
    mat4 world_to_view;
    mat4 view_to_projection;
};
";

    #[test]
    fn reflects_all_attributes() {
        let layout = ProgramLayout::reflect(TEXTURED_VS, "uniform texture2D ftex;");
        assert_eq!(
            layout.attributes,
            AttributeLocations { position: Some(0), color: Some(1), uv: Some(2) }
        );
        assert!(layout.has_transform);
        assert!(layout.has_texture);
    }

    #[test]
    fn missing_attribute_is_none() {
        let vs = "layout(location = 0) in vec2 position;\nlayout(location = 1) in vec4 color;\n";
        let layout = ProgramLayout::reflect(vs, "");
        assert_eq!(layout.attributes.uv, None);
        assert!(!layout.has_transform);
        assert!(!layout.has_texture);
    }

    #[test]
    fn outputs_are_not_attributes() {
        let vs = "layout(location = 0) out vec4 color;\n";
        assert_eq!(ProgramLayout::reflect(vs, "").attributes.color, None);
    }

    #[test]
    fn commented_uniforms_do_not_count() {
        let fs = "// uniform texture2D ftex;\nuniform texture2D ftex_other;\n";
        assert!(!ProgramLayout::reflect("", fs).has_texture);
    }
}
