//! Interaction Resolver
//!
//! Turns renderer pick events into a `HoverState` and tracks the click
//! emphasis toggle. Every pointer event replaces the previous hover state
//! wholesale.

use serde::Serialize;

use crate::activation::ActivationDataset;
use crate::geometry::{Point3, RenderMesh};

/// Default mesh scale while emphasized
pub const DEFAULT_EMPHASIS_SCALE: f32 = 1.1;

/// A hit reported by the external renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickEvent {
    /// World-space hit point
    pub point: Point3,
    /// First vertex of the hit triangle
    pub vertex_index: usize,
}

impl PickEvent {
    pub fn new(point: Point3, vertex_index: usize) -> Self {
        Self {
            point,
            vertex_index,
        }
    }

    /// Build from a hit face index, taking the face's first vertex
    pub fn from_face(mesh: &RenderMesh, point: Point3, face: usize) -> Option<Self> {
        let vertex = *mesh.indices().get(face.checked_mul(3)?)?;
        Some(Self::new(point, vertex as usize))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HoverState {
    pub vertex_index: Option<usize>,
    pub pick_position: Option<Point3>,
    pub value: Option<f32>,
}

impl HoverState {
    pub fn is_active(&self) -> bool {
        self.vertex_index.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct InteractionResolver {
    hover: HoverState,
    emphasized: bool,
    emphasis_scale: f32,
}

impl Default for InteractionResolver {
    fn default() -> Self {
        Self::new(DEFAULT_EMPHASIS_SCALE)
    }
}

impl InteractionResolver {
    pub fn new(emphasis_scale: f32) -> Self {
        Self {
            hover: HoverState::default(),
            emphasized: false,
            emphasis_scale,
        }
    }

    /// Pointer entered or moved over the surface
    pub fn pointer_over(
        &mut self,
        event: PickEvent,
        dataset: &ActivationDataset,
        time_index: usize,
    ) -> HoverState {
        self.hover = HoverState {
            vertex_index: Some(event.vertex_index),
            pick_position: Some(event.point),
            value: dataset.value_at(time_index, event.vertex_index),
        };
        self.hover
    }

    /// Pointer left the surface
    pub fn pointer_out(&mut self) -> HoverState {
        self.hover = HoverState::default();
        self.hover
    }

    /// Flip emphasis, returning the new mesh scale
    pub fn pointer_down(&mut self) -> f32 {
        self.emphasized = !self.emphasized;
        self.scale()
    }

    /// Re-read the hovered vertex's value after the time index moved
    pub fn refresh_value(&mut self, dataset: &ActivationDataset, time_index: usize) {
        if let Some(vertex) = self.hover.vertex_index {
            self.hover.value = dataset.value_at(time_index, vertex);
        }
    }

    pub fn hover(&self) -> &HoverState {
        &self.hover
    }

    pub fn is_emphasized(&self) -> bool {
        self.emphasized
    }

    pub fn scale(&self) -> f32 {
        if self.emphasized {
            self.emphasis_scale
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> ActivationDataset {
        ActivationDataset::from_frames(
            vec![0.0, 0.1],
            vec![vec![0.25, 0.75], vec![0.5, 1.5]],
            2,
            0.01,
        )
        .unwrap()
    }

    #[test]
    fn test_hover_resolves_value() {
        let mut resolver = InteractionResolver::default();
        let hover = resolver.pointer_over(PickEvent::new([0.1, 0.2, 0.3], 1), &dataset(), 1);

        assert_eq!(hover.vertex_index, Some(1));
        assert_eq!(hover.pick_position, Some([0.1, 0.2, 0.3]));
        assert_eq!(hover.value, Some(1.5));
        assert!(hover.is_active());
    }

    #[test]
    fn test_out_of_range_vertex_has_no_value() {
        let mut resolver = InteractionResolver::default();
        let hover = resolver.pointer_over(PickEvent::new([0.0; 3], 9), &dataset(), 0);

        assert_eq!(hover.vertex_index, Some(9));
        assert_eq!(hover.value, None);
    }

    #[test]
    fn test_no_data_has_no_value() {
        let mut resolver = InteractionResolver::default();
        let hover = resolver.pointer_over(
            PickEvent::new([0.0; 3], 0),
            &ActivationDataset::empty(),
            0,
        );
        assert_eq!(hover.value, None);
    }

    #[test]
    fn test_pointer_out_clears_everything() {
        let mut resolver = InteractionResolver::default();
        resolver.pointer_over(PickEvent::new([1.0; 3], 0), &dataset(), 0);

        assert_eq!(resolver.pointer_out(), HoverState::default());
        assert!(!resolver.hover().is_active());
    }

    #[test]
    fn test_last_event_wins() {
        let mut resolver = InteractionResolver::default();
        let data = dataset();
        resolver.pointer_over(PickEvent::new([1.0; 3], 0), &data, 0);
        resolver.pointer_over(PickEvent::new([2.0; 3], 1), &data, 0);

        assert_eq!(resolver.hover().vertex_index, Some(1));
        assert_eq!(resolver.hover().value, Some(0.75));
    }

    #[test]
    fn test_emphasis_toggles_independently_of_hover() {
        let mut resolver = InteractionResolver::default();
        assert_eq!(resolver.scale(), 1.0);

        assert_eq!(resolver.pointer_down(), DEFAULT_EMPHASIS_SCALE);
        resolver.pointer_out();
        assert!(resolver.is_emphasized());
        assert_eq!(resolver.pointer_down(), 1.0);
    }

    #[test]
    fn test_refresh_follows_time_index() {
        let mut resolver = InteractionResolver::default();
        let data = dataset();
        resolver.pointer_over(PickEvent::new([0.0; 3], 0), &data, 0);
        resolver.refresh_value(&data, 1);

        assert_eq!(resolver.hover().value, Some(0.5));
    }

    #[test]
    fn test_pick_from_face_uses_first_vertex() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        let mesh = crate::geometry::assemble(&vertices, &[[0, 1, 2], [3, 2, 1]]).unwrap();

        let event = PickEvent::from_face(&mesh, [0.7, 0.7, 0.0], 1).unwrap();
        assert_eq!(event.vertex_index, 3);
        assert!(PickEvent::from_face(&mesh, [0.0; 3], 2).is_none());
    }

    #[test]
    fn test_huge_face_index_is_a_miss() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mesh = crate::geometry::assemble(&vertices, &[[0, 1, 2]]).unwrap();

        assert!(PickEvent::from_face(&mesh, [0.0; 3], usize::MAX).is_none());
        assert!(mesh.vertex(usize::MAX).is_none());
    }
}
