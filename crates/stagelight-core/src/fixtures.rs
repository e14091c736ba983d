//! Static catalog of fixture types.

use crate::paint::Rgb;
use kurbo::Size;

/// Definition of a placeable fixture type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureTypeDef {
    /// Unique key referenced by scene elements.
    pub id: &'static str,
    /// Human readable name for palettes and legends.
    pub display_name: &'static str,
    /// Default color for new instances.
    pub base_color: Rgb,
    /// Unscaled body width in pixels.
    pub nominal_width: f64,
    /// Unscaled body height in pixels.
    pub nominal_height: f64,
}

impl FixtureTypeDef {
    /// Body size after applying an instance scale.
    pub fn scaled_size(&self, scale: f64) -> Size {
        Size::new(self.nominal_width * scale, self.nominal_height * scale)
    }
}

/// Every fixture type, in palette order.
pub static FIXTURE_TYPES: [FixtureTypeDef; 8] = [
    FixtureTypeDef {
        id: "spot",
        display_name: "Spot",
        base_color: Rgb::from_u32(0xfacc15),
        nominal_width: 40.0,
        nominal_height: 40.0,
    },
    FixtureTypeDef {
        id: "wash",
        display_name: "Wash",
        base_color: Rgb::from_u32(0xfb923c),
        nominal_width: 50.0,
        nominal_height: 50.0,
    },
    FixtureTypeDef {
        id: "beam",
        display_name: "Beam",
        base_color: Rgb::from_u32(0x38bdf8),
        nominal_width: 30.0,
        nominal_height: 60.0,
    },
    FixtureTypeDef {
        id: "bar",
        display_name: "LED bar",
        base_color: Rgb::from_u32(0x22c55e),
        nominal_width: 80.0,
        nominal_height: 20.0,
    },
    FixtureTypeDef {
        id: "profile",
        display_name: "Profile",
        base_color: Rgb::from_u32(0xf472b6),
        nominal_width: 36.0,
        nominal_height: 52.0,
    },
    FixtureTypeDef {
        id: "fresnel",
        display_name: "Fresnel",
        base_color: Rgb::from_u32(0xfde68a),
        nominal_width: 44.0,
        nominal_height: 44.0,
    },
    FixtureTypeDef {
        id: "par",
        display_name: "PAR",
        base_color: Rgb::from_u32(0xa78bfa),
        nominal_width: 38.0,
        nominal_height: 38.0,
    },
    FixtureTypeDef {
        id: "strobe",
        display_name: "Strobe",
        base_color: Rgb::from_u32(0xe5e7eb),
        nominal_width: 56.0,
        nominal_height: 28.0,
    },
];

/// Look up a fixture type by id.
pub fn lookup(type_id: &str) -> Option<&'static FixtureTypeDef> {
    FIXTURE_TYPES.iter().find(|def| def.id == type_id)
}

/// Iterate over all fixture types in palette order.
pub fn all() -> impl Iterator<Item = &'static FixtureTypeDef> {
    FIXTURE_TYPES.iter()
}
