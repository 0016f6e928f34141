#![forbid(unsafe_code)]

//! Visual state of a node entity.
//!
//! A node renders as a rounded label plate with text on top. Selection
//! switches the plate from translucent to opaque, expands the label to
//! include the detail line, and swaps the text to a smaller regular face
//! in dark gray.

use nodemap_core::Vec3;
use nodemap_core::label::LabelSize;
use nodemap_graph::Node;

use crate::config::SceneConfig;

/// Linear RGBA color, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const DARK_GRAY: Self = Self::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 1.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Plate and text surface parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub plate_color: Rgba,
    pub plate_roughness: f32,
    pub text_color: Rgba,
    pub text_roughness: f32,
}

impl Material {
    /// Opaque white plate, dark-gray text.
    pub const SELECTED: Self = Self {
        plate_color: Rgba::WHITE,
        plate_roughness: 0.1,
        text_color: Rgba::DARK_GRAY,
        text_roughness: 0.8,
    };

    /// Translucent white plate, white text.
    pub const UNSELECTED: Self = Self {
        plate_color: Rgba::WHITE.with_alpha(0.3),
        plate_roughness: 0.1,
        text_color: Rgba::WHITE,
        text_roughness: 0.8,
    };
}

/// Everything a surface needs to draw a node entity.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAppearance {
    /// Text shown on the plate.
    pub label_text: String,
    /// Plate size in meters.
    pub label_size: LabelSize,
    /// Box used for gesture targeting: plate width, plate height, hit depth.
    pub hit_extent: Vec3,
    /// Resting uniform scale.
    pub scale: f32,
    pub material: Material,
    pub font_size: f32,
    pub font_weight: FontWeight,
    /// Plate corner radius; half the plate height makes a capsule.
    pub corner_radius: f32,
    /// Whether the label shows the detail line.
    pub expanded: bool,
    pub selected: bool,
}

impl NodeAppearance {
    /// Appearance of `node` in the given selection state.
    #[must_use]
    pub fn for_node(node: &Node, selected: bool, config: &SceneConfig) -> Self {
        let expanded = selected && node.has_detail();
        let label_text = node.label_text(expanded);
        let label_size = config.label_metrics.size_for(&label_text, expanded);
        let base_font = config.label_metrics.font_size;
        let (material, font_size, font_weight) = if selected {
            (Material::SELECTED, base_font * 0.8, FontWeight::Regular)
        } else {
            (Material::UNSELECTED, base_font, FontWeight::Bold)
        };

        Self {
            hit_extent: Vec3::new(label_size.width, label_size.height, config.hit_depth),
            corner_radius: label_size.height * 0.5,
            scale: config.resting_scale_for(selected),
            label_text,
            label_size,
            material,
            font_size,
            font_weight,
            expanded,
            selected,
        }
    }
}
