//! Shader programs per effect kind
//!
//! Every program is assembled from three WGSL pieces: the shared prelude
//! (`common.wgsl`), the card vertex stage (`card_vertex.wgsl`) and the
//! kind's fragment file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::effects::EffectKind;
use crate::error::ShaderError;

pub const COMMON_SHADER: &str = include_str!("effects/common.wgsl");
pub const CARD_VERTEX_SHADER: &str = include_str!("effects/card_vertex.wgsl");
pub const HOLOGRAPHIC_SHADER: &str = include_str!("effects/holographic.wgsl");
pub const METALLIC_SHADER: &str = include_str!("effects/metallic.wgsl");
pub const PRISMATIC_SHADER: &str = include_str!("effects/prismatic.wgsl");
pub const GALAXY_SHADER: &str = include_str!("effects/galaxy.wgsl");
pub const CRYSTAL_SHADER: &str = include_str!("effects/crystal.wgsl");
pub const SECRET_RARE_SHADER: &str = include_str!("effects/secret_rare.wgsl");

const COMMON_FILE: &str = "common.wgsl";
const VERTEX_FILE: &str = "card_vertex.wgsl";

/// Uniform values shared by every program, in block order
pub const SHARED_UNIFORMS: [&str; 9] = [
    "viewProj",
    "model",
    "lightDir",
    "cameraPos",
    "time",
    "intensity",
    "opacity",
    "flatColor",
    "flags",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Vec3,
}

/// One kind-specific value in the parameter slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformField {
    /// Host parameter name the value is read from
    pub name: &'static str,
    pub slot: usize,
    pub ty: UniformType,
}

impl UniformField {
    const fn float(name: &'static str, slot: usize) -> Self {
        Self {
            name,
            slot,
            ty: UniformType::Float,
        }
    }

    const fn vec3(name: &'static str, slot: usize) -> Self {
        Self {
            name,
            slot,
            ty: UniformType::Vec3,
        }
    }
}

/// Layout of the kind-specific parameter slots of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSchema {
    pub fields: Vec<UniformField>,
}

impl UniformSchema {
    pub fn for_kind(kind: EffectKind) -> Self {
        use UniformField as F;
        let fields = match kind {
            EffectKind::Holographic => vec![
                F::float("rainbowSpread", 0),
                F::float("interferenceScale", 1),
                F::float("filmThickness", 2),
                F::float("fresnelPower", 3),
                F::float("speed", 4),
            ],
            EffectKind::Metallic => vec![
                F::float("brushAngle", 0),
                F::float("brushDensity", 1),
                F::float("anisotropy", 2),
                F::vec3("tint", 4),
            ],
            EffectKind::Prismatic => vec![
                F::float("refractiveIndex", 0),
                F::float("dispersion", 1),
                F::float("refractionStrength", 2),
            ],
            EffectKind::Galaxy => vec![
                F::float("octaves", 0),
                F::float("arms", 1),
                F::float("swirl", 2),
                F::float("starDensity", 3),
                F::vec3("coreColor", 4),
                F::vec3("armColor", 8),
            ],
            EffectKind::Crystal => vec![
                F::float("refractiveIndex", 0),
                F::float("facetScale", 1),
                F::float("sparkle", 2),
            ],
            EffectKind::SecretRare => vec![
                F::float("embossStrength", 0),
                F::float("foilSpeed", 1),
                F::float("rainbowSpread", 2),
                F::float("displacement", 3),
                F::vec3("primaryColor", 4),
                F::vec3("secondaryColor", 8),
            ],
        };
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Highest slot index used plus one
    pub fn slots_used(&self) -> usize {
        self.fields
            .iter()
            .map(|f| match f.ty {
                UniformType::Float => f.slot + 1,
                UniformType::Vec3 => f.slot + 3,
            })
            .max()
            .unwrap_or(0)
    }
}

/// A complete effect program.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderProgram {
    pub kind: EffectKind,
    /// Shared prelude followed by the vertex stage
    pub vertex_source: String,
    pub fragment_source: String,
    pub uniform_schema: UniformSchema,
    /// Bumped on every hot reload so GPU pipelines know to rebuild
    pub revision: u32,
}

impl ShaderProgram {
    /// The single WGSL module handed to the device
    pub fn module_source(&self) -> String {
        format!("{}\n{}", self.vertex_source, self.fragment_source)
    }

    pub fn label(&self) -> String {
        format!("{} Effect Shader", self.kind.display_name())
    }

    /// Parse and validate the assembled module.
    pub fn validate(&self) -> Result<(), ShaderError> {
        let source = self.module_source();
        let module = naga::front::wgsl::parse_str(&source).map_err(|err| ShaderError::Invalid {
            kind: self.kind,
            message: err.emit_to_string(&source),
        })?;
        naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::default())
            .validate(&module)
            .map_err(|err| ShaderError::Invalid {
                kind: self.kind,
                message: err.to_string(),
            })?;
        Ok(())
    }
}

/// File name of a kind's fragment source under `shaders/effects/`
pub fn shader_file(kind: EffectKind) -> Option<&'static str> {
    match kind {
        EffectKind::Holographic => Some("holographic.wgsl"),
        EffectKind::Metallic => Some("metallic.wgsl"),
        EffectKind::Prismatic => Some("prismatic.wgsl"),
        EffectKind::Galaxy => Some("galaxy.wgsl"),
        EffectKind::Crystal => Some("crystal.wgsl"),
        EffectKind::SecretRare => Some("secret_rare.wgsl"),
    }
}

fn builtin_fragment(kind: EffectKind) -> Option<&'static str> {
    match kind {
        EffectKind::Holographic => Some(HOLOGRAPHIC_SHADER),
        EffectKind::Metallic => Some(METALLIC_SHADER),
        EffectKind::Prismatic => Some(PRISMATIC_SHADER),
        EffectKind::Galaxy => Some(GALAXY_SHADER),
        EffectKind::Crystal => Some(CRYSTAL_SHADER),
        EffectKind::SecretRare => Some(SECRET_RARE_SHADER),
    }
}

/// Maps effect kinds to their shader programs.
///
/// Programs are shared as `Arc`s; a reload replaces the entry and bumps the
/// revision, leaving materials built earlier on the old program until they
/// are rebuilt.
#[derive(Debug, Clone)]
pub struct ShaderCatalog {
    common: String,
    vertex: String,
    programs: HashMap<EffectKind, Arc<ShaderProgram>>,
}

impl Default for ShaderCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ShaderCatalog {
    /// Catalog without any programs
    pub fn empty() -> Self {
        Self {
            common: COMMON_SHADER.to_string(),
            vertex: CARD_VERTEX_SHADER.to_string(),
            programs: HashMap::new(),
        }
    }

    /// Catalog with the embedded programs for every kind that has one
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for kind in EffectKind::ALL {
            if let Some(fragment) = builtin_fragment(kind) {
                catalog.register(kind, fragment);
            }
        }
        catalog
    }

    /// Register or replace the fragment source for a kind
    pub fn register(&mut self, kind: EffectKind, fragment_source: impl Into<String>) {
        let revision = self.programs.get(&kind).map_or(0, |p| p.revision + 1);
        let program = ShaderProgram {
            kind,
            vertex_source: self.vertex_source(),
            fragment_source: fragment_source.into(),
            uniform_schema: UniformSchema::for_kind(kind),
            revision,
        };
        self.programs.insert(kind, Arc::new(program));
    }

    pub fn unregister(&mut self, kind: EffectKind) -> Option<Arc<ShaderProgram>> {
        self.programs.remove(&kind)
    }

    pub fn get(&self, kind: EffectKind) -> Option<Arc<ShaderProgram>> {
        self.programs.get(&kind).cloned()
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.programs.contains_key(&kind)
    }

    /// Registered kinds in kind order
    pub fn kinds(&self) -> Vec<EffectKind> {
        EffectKind::ALL
            .into_iter()
            .filter(|k| self.programs.contains_key(k))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Re-read a changed shader file and swap it into the catalog.
    ///
    /// Returns the kinds whose program changed. Editing the prelude or the
    /// vertex stage affects every registered program. Every affected
    /// program is validated first; on failure the catalog is unchanged.
    pub fn reload_file(&mut self, path: &Path) -> Result<Vec<EffectKind>, ShaderError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ShaderError::UnknownShaderFile(path.to_path_buf()))?;

        let target = if file_name == COMMON_FILE || file_name == VERTEX_FILE {
            None
        } else {
            let kind = EffectKind::ALL
                .into_iter()
                .find(|k| shader_file(*k) == Some(file_name))
                .ok_or_else(|| ShaderError::UnknownShaderFile(path.to_path_buf()))?;
            Some(kind)
        };

        let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut next = self.clone();
        let changed = match target {
            Some(kind) => {
                next.register(kind, source);
                vec![kind]
            }
            None => {
                if file_name == COMMON_FILE {
                    next.common = source;
                } else {
                    next.vertex = source;
                }
                let kinds = next.kinds();
                for kind in &kinds {
                    if let Some(program) = next.programs.get(kind) {
                        let fragment = program.fragment_source.clone();
                        next.register(*kind, fragment);
                    }
                }
                kinds
            }
        };
        for program in changed.iter().filter_map(|kind| next.programs.get(kind)) {
            program.validate()?;
        }
        *self = next;

        tracing::info!(
            target: "foilcard::shaders",
            file = file_name,
            programs = changed.len(),
            "Shader source reloaded"
        );
        Ok(changed)
    }

    fn vertex_source(&self) -> String {
        format!("{}\n{}", self.common, self.vertex)
    }
}
