//! Stable (tag, ordinal) indexing for solver integration.
//!
//! Loads, excitations and network ports address segments the way card decks
//! do: by wire tag plus the 1-based position of the segment among all
//! segments carrying that tag. This module maps those addresses to the
//! contiguous absolute indices (0..N) used by the interaction matrix.

use std::collections::BTreeMap;

use crate::geometry::{Segment, Tag};

/// Map from tag number to the absolute indices of its segments, in order.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    by_tag: BTreeMap<Tag, Vec<usize>>,
}

impl TagIndex {
    /// Build the index from a segment list.
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut by_tag: BTreeMap<Tag, Vec<usize>> = BTreeMap::new();
        for (i, seg) in segments.iter().enumerate() {
            if seg.tag != 0 {
                by_tag.entry(seg.tag).or_default().push(i);
            }
        }
        Self { by_tag }
    }

    /// Absolute index of the `ordinal`-th (1-based) segment with `tag`.
    ///
    /// Tag 0 addresses segments by absolute 1-based number.
    pub fn lookup(&self, tag: Tag, ordinal: u32, segment_count: usize) -> Option<usize> {
        let pos = (ordinal as usize).checked_sub(1)?;
        if tag == 0 {
            return (pos < segment_count).then_some(pos);
        }
        self.by_tag.get(&tag).and_then(|list| list.get(pos).copied())
    }

    /// All absolute indices carrying `tag` (empty for unknown tags).
    pub fn segments_with_tag(&self, tag: Tag) -> &[usize] {
        self.by_tag.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tags present, ascending.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.by_tag.keys().copied()
    }

    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{GeometryBuilder, WireSpec};
    use crate::geometry::GroundPlaneMode;
    use nec_core::vec3;

    fn two_wires() -> crate::Geometry {
        let mut builder = GeometryBuilder::new();
        builder
            .add_wire(WireSpec::new(
                7,
                3,
                vec3(0.0, 0.0, 0.0),
                vec3(0.0, 0.0, 3.0),
                0.01,
            ))
            .unwrap();
        builder
            .add_wire(WireSpec::new(
                0,
                2,
                vec3(5.0, 0.0, 0.0),
                vec3(5.0, 0.0, 2.0),
                0.01,
            ))
            .unwrap();
        builder.seal(GroundPlaneMode::NoGround).unwrap()
    }

    #[test]
    fn tagged_lookup_is_ordinal_within_tag() {
        let g = two_wires();
        let idx = g.tag_index();
        assert_eq!(idx.lookup(7, 1, 5), Some(0));
        assert_eq!(idx.lookup(7, 3, 5), Some(2));
        assert_eq!(idx.lookup(7, 4, 5), None);
        assert_eq!(idx.segments_with_tag(7), &[0, 1, 2]);
    }

    #[test]
    fn tag_zero_is_absolute() {
        let g = two_wires();
        assert_eq!(g.find_segment(0, 4), Some(3));
        assert_eq!(g.find_segment(0, 6), None);
        assert_eq!(g.find_segment(0, 0), None);
    }

    #[test]
    fn untagged_wires_are_not_indexed_by_tag() {
        let g = two_wires();
        assert_eq!(g.tag_index().tag_count(), 1);
        assert!(g.tag_index().segments_with_tag(0).is_empty());
        assert_eq!(g.tag_index().tags().collect::<Vec<_>>(), vec![7]);
    }
}
