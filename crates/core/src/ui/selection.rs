//! Crop drag handling and coordinate mapping.
//!
//! This module contains logic for turning pointer drags into
//! aspect-constrained crop rectangles and mapping between screen
//! coordinates and the image-local display space the session works in.

use crate::crop::geometry::CropRect;
use eframe::egui;

/// Minimum distance (in points) for a drag to be considered a crop gesture.
pub const MIN_DRAG_DISTANCE: f32 = 10.0;

/// Result of processing pointer input over the crop image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    /// A new drag began.
    Started,
    /// The pointer moved with the button held.
    Dragging,
    /// The drag ended far enough from its start to count.
    Finished,
    /// The drag ended too close to its start; treated as an accidental click.
    Discarded,
    /// Nothing happened this frame.
    None,
}

/// Determines if a drag covered enough distance to be intentional.
pub fn is_valid_drag(start: egui::Pos2, end: egui::Pos2) -> bool {
    start.distance(end) > MIN_DRAG_DISTANCE
}

/// Processes drag input and updates the gesture endpoints.
pub fn process_drag_event(
    response: &egui::Response,
    start: &mut Option<egui::Pos2>,
    current: &mut Option<egui::Pos2>,
) -> DragEvent {
    if response.drag_started() {
        *start = response.interact_pointer_pos();
        *current = response.interact_pointer_pos();
        return DragEvent::Started;
    }

    if response.dragged() {
        *current = response.interact_pointer_pos();
        return DragEvent::Dragging;
    }

    if response.drag_stopped() {
        if let (Some(s), Some(e)) = (*start, *current) {
            let event = if is_valid_drag(s, e) {
                DragEvent::Finished
            } else {
                DragEvent::Discarded
            };
            *start = None;
            *current = None;
            return event;
        }
    }

    DragEvent::None
}

/// Builds the largest aspect-constrained rectangle reachable from a drag.
///
/// The rectangle is anchored at the drag start, grows toward the current
/// pointer position in whichever direction the user dragged, and never
/// leaves `bounds`.
pub fn aspect_rect_from_drag(
    start: egui::Pos2,
    current: egui::Pos2,
    aspect: f32,
    bounds: egui::Rect,
) -> egui::Rect {
    let current = bounds.clamp(current);
    let dx = current.x - start.x;
    let dy = current.y - start.y;

    let width = dx.abs().min(dy.abs() * aspect);
    let height = width / aspect;

    let x = if dx >= 0.0 { start.x } else { start.x - width };
    let y = if dy >= 0.0 { start.y } else { start.y - height };

    egui::Rect::from_min_size(egui::pos2(x, y), egui::vec2(width, height))
}

/// Converts a screen-space rectangle into a display-space [`CropRect`]
/// relative to the image origin.
pub fn to_crop_rect(rect: egui::Rect, image_origin: egui::Pos2) -> CropRect {
    CropRect::new(
        rect.min.x - image_origin.x,
        rect.min.y - image_origin.y,
        rect.width(),
        rect.height(),
    )
}

/// Converts a display-space [`CropRect`] back into screen coordinates.
pub fn to_screen_rect(crop: &CropRect, image_origin: egui::Pos2) -> egui::Rect {
    egui::Rect::from_min_size(
        egui::pos2(image_origin.x + crop.x, image_origin.y + crop.y),
        egui::vec2(crop.width, crop.height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> egui::Rect {
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(400.0, 300.0))
    }

    #[test]
    fn drag_down_right_anchors_at_start() {
        let rect = aspect_rect_from_drag(
            egui::pos2(10.0, 20.0),
            egui::pos2(110.0, 90.0),
            1.0,
            bounds(),
        );

        // Square limited by the shorter drag axis
        assert_eq!(rect.min, egui::pos2(10.0, 20.0));
        assert_eq!(rect.size(), egui::vec2(70.0, 70.0));
    }

    #[test]
    fn drag_up_left_grows_backward_from_start() {
        let rect = aspect_rect_from_drag(
            egui::pos2(200.0, 200.0),
            egui::pos2(140.0, 120.0),
            1.0,
            bounds(),
        );

        assert_eq!(rect.size(), egui::vec2(60.0, 60.0));
        assert_eq!(rect.max, egui::pos2(200.0, 200.0));
    }

    #[test]
    fn pointer_outside_bounds_is_clamped() {
        let rect = aspect_rect_from_drag(
            egui::pos2(350.0, 250.0),
            egui::pos2(900.0, 900.0),
            1.0,
            bounds(),
        );

        assert!(rect.max.x <= bounds().max.x);
        assert!(rect.max.y <= bounds().max.y);
        assert_eq!(rect.size(), egui::vec2(50.0, 50.0));
    }

    #[test]
    fn crop_rect_round_trips_through_screen_space() {
        let origin = egui::pos2(30.0, 40.0);
        let screen = egui::Rect::from_min_size(egui::pos2(50.0, 60.0), egui::vec2(80.0, 80.0));

        let crop = to_crop_rect(screen, origin);
        assert_eq!((crop.x, crop.y), (20.0, 20.0));
        assert_eq!(to_screen_rect(&crop, origin), screen);
    }
}
