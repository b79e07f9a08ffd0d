//! Rendering helpers for the crop dialog.
//!
//! This module contains reusable drawing functions for the crop overlay:
//! the dimmed surround, the rectangle border and the rule-of-thirds grid.

use eframe::egui;

/// Draws a dark overlay with a transparent "cutout" for the crop area.
///
/// The selected region stays clear while the rest of the image is dimmed,
/// so the user can judge the crop against its surroundings.
///
/// # Arguments
/// * `painter` - The egui painter to draw with
/// * `image_rect` - The full rendered image rectangle
/// * `crop_rect` - The crop area to keep clear
/// * `alpha` - Darkness level (0-255, higher = darker)
pub fn draw_crop_overlay(
    painter: &egui::Painter,
    image_rect: egui::Rect,
    crop_rect: egui::Rect,
    alpha: u8,
) {
    let color = egui::Color32::from_black_alpha(alpha);

    // Top region (above the crop)
    painter.rect_filled(
        egui::Rect::from_min_max(
            image_rect.min,
            egui::pos2(image_rect.max.x, crop_rect.min.y),
        ),
        0.0,
        color,
    );

    // Bottom region (below the crop)
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(image_rect.min.x, crop_rect.max.y),
            image_rect.max,
        ),
        0.0,
        color,
    );

    // Left region (between top and bottom)
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(image_rect.min.x, crop_rect.min.y),
            egui::pos2(crop_rect.min.x, crop_rect.max.y),
        ),
        0.0,
        color,
    );

    // Right region (between top and bottom)
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(crop_rect.max.x, crop_rect.min.y),
            egui::pos2(image_rect.max.x, crop_rect.max.y),
        ),
        0.0,
        color,
    );
}

/// Draws a border around the crop rectangle.
pub fn draw_crop_border(
    painter: &egui::Painter,
    crop_rect: egui::Rect,
    stroke_width: f32,
    color: egui::Color32,
) {
    painter.rect_stroke(
        crop_rect,
        0.0,
        egui::Stroke::new(stroke_width, color),
        egui::StrokeKind::Middle,
    );
}

/// Draws rule-of-thirds guides inside the crop rectangle.
pub fn draw_crop_grid(painter: &egui::Painter, crop_rect: egui::Rect, color: egui::Color32) {
    let stroke = egui::Stroke::new(1.0, color);

    for i in 1..3 {
        let t = i as f32 / 3.0;

        let x = crop_rect.min.x + crop_rect.width() * t;
        painter.line_segment(
            [
                egui::pos2(x, crop_rect.min.y),
                egui::pos2(x, crop_rect.max.y),
            ],
            stroke,
        );

        let y = crop_rect.min.y + crop_rect.height() * t;
        painter.line_segment(
            [
                egui::pos2(crop_rect.min.x, y),
                egui::pos2(crop_rect.max.x, y),
            ],
            stroke,
        );
    }
}
