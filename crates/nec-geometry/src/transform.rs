//! Coordinate transforms and reflections applied while building.

use nec_core::{Rot3, Vec3, rotation_xyz, vec3};

use crate::geometry::{Segment, Tag};
use crate::patch::Patch;

/// Which part of the structure a [`Transform`] addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformTarget {
    /// Every segment and patch.
    #[default]
    Whole,
    /// Segments from the first one carrying this tag through the end.
    FromTag(Tag),
}

/// Rotate (about X, then Y, then Z) and translate, optionally generating copies.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Added to non-zero tags of each generated copy.
    pub tag_increment: Tag,
    /// 0 moves the addressed structure in place; n > 0 generates n copies.
    pub repeat_count: u32,
    pub rotation_deg: Vec3,
    pub translation: Vec3,
    pub target: TransformTarget,
}

impl Transform {
    /// In-place move of the whole structure.
    pub fn moving(rotation_deg: Vec3, translation: Vec3) -> Self {
        Self {
            tag_increment: 0,
            repeat_count: 0,
            rotation_deg,
            translation,
            target: TransformTarget::Whole,
        }
    }

    pub(crate) fn rotation(&self) -> Rot3 {
        rotation_xyz(self.rotation_deg.x, self.rotation_deg.y, self.rotation_deg.z)
    }
}

/// Axes selected for a reflection directive.
///
/// Reflection "in X" mirrors across the YZ plane (x -> -x), and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReflectAxes {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl ReflectAxes {
    pub const NONE: Self = Self {
        x: false,
        y: false,
        z: false,
    };

    pub fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    /// Decode the classic three-digit flag (hundreds = X, tens = Y, units = Z).
    pub fn from_digits(code: u32) -> Option<Self> {
        let digit = |d: u32| match d {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        };
        if code > 111 {
            return None;
        }
        Some(Self {
            x: digit(code / 100)?,
            y: digit((code / 10) % 10)?,
            z: digit(code % 10)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        !(self.x || self.y || self.z)
    }

    /// Mirror vectors for the selected axes in application order: Z, Y, X.
    pub fn passes(&self) -> impl Iterator<Item = Vec3> {
        [
            (self.z, vec3(1.0, 1.0, -1.0)),
            (self.y, vec3(1.0, -1.0, 1.0)),
            (self.x, vec3(-1.0, 1.0, 1.0)),
        ]
        .into_iter()
        .filter_map(|(on, m)| on.then_some(m))
    }
}

pub(crate) fn increment_tag(tag: Tag, by: Tag) -> Tag {
    if tag == 0 { 0 } else { tag.saturating_add(by) }
}

pub(crate) fn move_segment(seg: &mut Segment, rot: &Rot3, shift: &Vec3) {
    seg.start = rot * seg.start + shift;
    seg.end = rot * seg.end + shift;
}

pub(crate) fn move_patch(patch: &mut Patch, rot: &Rot3, shift: &Vec3) {
    patch.center = rot * patch.center + shift;
    patch.normal = rot * patch.normal;
    patch.t1 = rot * patch.t1;
    patch.t2 = rot * patch.t2;
}

pub(crate) fn mirror_segment(seg: &mut Segment, mirror: &Vec3) {
    seg.start.component_mul_assign(mirror);
    seg.end.component_mul_assign(mirror);
}

pub(crate) fn mirror_patch(patch: &mut Patch, mirror: &Vec3) {
    patch.center.component_mul_assign(mirror);
    patch.normal.component_mul_assign(mirror);
    patch.t1.component_mul_assign(mirror);
    // Reflection flips handedness; rebuild t2 so t1 x t2 stays the normal.
    patch.t2 = patch.normal.cross(&patch.t1);
}
