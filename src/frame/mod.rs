//! Frame and case overlays
//!
//! Frames are composited independently of the effect stack and always sit
//! outside it in depth. Two families exist:
//!
//! - **Border**: a flat decorative ring sized `card × multiplier`
//! - **Case**: a back panel, four thin side walls and an optional glass
//!   front (glass only at medium tier and above)
//!
//! One frame is active at a time, chosen by name from [`FrameCatalog`].

mod builder;

pub use builder::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name that selects no frame
pub const NO_FRAME: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameKind {
    Border,
    Case,
}

/// Surface parameters of one frame part
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMaterial {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    /// Non-zero for transmissive glass/plastic
    pub transmission: f32,
    pub opacity: f32,
}

impl FrameMaterial {
    pub const fn solid(color: [f32; 3], metalness: f32, roughness: f32) -> Self {
        Self {
            color,
            metalness,
            roughness,
            transmission: 0.0,
            opacity: 1.0,
        }
    }

    pub const fn glass(color: [f32; 3], transmission: f32, opacity: f32) -> Self {
        Self {
            color,
            metalness: 0.0,
            roughness: 0.05,
            transmission,
            opacity,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.transmission > 0.0 || self.opacity < 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMaterials {
    pub primary: FrameMaterial,
    pub secondary: Option<FrameMaterial>,
    pub glass: Option<FrameMaterial>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameConfig {
    /// Frame size relative to the card
    pub multiplier: f32,
    /// Case depth in world units (0 for borders)
    pub depth: f32,
    pub kind: FrameKind,
    pub materials: FrameMaterials,
}

/// Named frame configurations.
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    frames: BTreeMap<String, FrameConfig>,
}

impl Default for FrameCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FrameCatalog {
    pub fn empty() -> Self {
        Self {
            frames: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        const CLEAR: [f32; 3] = [0.95, 0.97, 1.0];

        let mut catalog = Self::empty();
        catalog.register(
            "classic-border",
            FrameConfig {
                multiplier: 1.06,
                depth: 0.0,
                kind: FrameKind::Border,
                materials: FrameMaterials {
                    primary: FrameMaterial::solid([0.96, 0.95, 0.92], 0.0, 0.6),
                    secondary: None,
                    glass: None,
                },
            },
        );
        catalog.register(
            "gold-border",
            FrameConfig {
                multiplier: 1.08,
                depth: 0.0,
                kind: FrameKind::Border,
                materials: FrameMaterials {
                    primary: FrameMaterial::solid([1.0, 0.78, 0.34], 1.0, 0.25),
                    secondary: None,
                    glass: None,
                },
            },
        );
        catalog.register(
            "holo-border",
            FrameConfig {
                multiplier: 1.08,
                depth: 0.0,
                kind: FrameKind::Border,
                materials: FrameMaterials {
                    primary: FrameMaterial::solid([0.85, 0.88, 0.95], 0.9, 0.1),
                    secondary: Some(FrameMaterial::solid([0.7, 0.6, 1.0], 0.9, 0.1)),
                    glass: None,
                },
            },
        );
        catalog.register(
            "toploader",
            FrameConfig {
                multiplier: 1.1,
                depth: 0.04,
                kind: FrameKind::Case,
                materials: FrameMaterials {
                    primary: FrameMaterial::glass(CLEAR, 0.8, 0.35),
                    secondary: None,
                    glass: Some(FrameMaterial::glass(CLEAR, 0.95, 0.2)),
                },
            },
        );
        catalog.register(
            "magnetic-case",
            FrameConfig {
                multiplier: 1.18,
                depth: 0.08,
                kind: FrameKind::Case,
                materials: FrameMaterials {
                    primary: FrameMaterial::solid([0.08, 0.08, 0.09], 0.2, 0.5),
                    secondary: Some(FrameMaterial::solid([0.6, 0.6, 0.62], 0.9, 0.3)),
                    glass: Some(FrameMaterial::glass(CLEAR, 0.95, 0.15)),
                },
            },
        );
        catalog.register(
            "graded-slab",
            FrameConfig {
                multiplier: 1.3,
                depth: 0.12,
                kind: FrameKind::Case,
                materials: FrameMaterials {
                    primary: FrameMaterial::glass(CLEAR, 0.85, 0.4),
                    secondary: Some(FrameMaterial::solid([0.85, 0.1, 0.12], 0.0, 0.7)),
                    glass: Some(FrameMaterial::glass(CLEAR, 0.95, 0.2)),
                },
            },
        );
        catalog
    }

    pub fn register(&mut self, name: impl Into<String>, config: FrameConfig) {
        self.frames.insert(name.into(), config);
    }

    pub fn get(&self, name: &str) -> Option<&FrameConfig> {
        self.frames.get(name)
    }

    /// Catalog names in sorted order (excluding "none")
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.frames.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = FrameCatalog::builtin();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(
            names,
            vec!["classic-border", "gold-border", "graded-slab", "holo-border", "magnetic-case", "toploader"]
        );
        assert!(catalog.get(NO_FRAME).is_none());
    }

    #[test]
    fn test_case_frames_have_depth_and_glass() {
        let catalog = FrameCatalog::builtin();
        for name in catalog.names() {
            let config = catalog.get(name).unwrap();
            match config.kind {
                FrameKind::Case => {
                    assert!(config.depth > 0.0, "{name}");
                    assert!(config.materials.glass.is_some(), "{name}");
                }
                FrameKind::Border => assert!(config.materials.glass.is_none(), "{name}"),
            }
            assert!(config.multiplier > 1.0);
        }
    }

    #[test]
    fn test_glass_is_transparent() {
        assert!(FrameMaterial::glass([1.0; 3], 0.9, 0.2).is_transparent());
        assert!(!FrameMaterial::solid([1.0; 3], 1.0, 0.2).is_transparent());
    }
}
