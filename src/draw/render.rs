use crate::draw::model::{PathCollection, PenStyle};
use eframe::egui::{Painter, Pos2, Shape, Stroke};

/// Shapes for every visible polyline, in drawing order. Each line gets
/// filled discs at its vertices so caps and joins come out round.
pub fn stroke_shapes(paths: &PathCollection, pen: PenStyle) -> Vec<Shape> {
    let radius = pen.width / 2.0;
    let mut shapes = Vec::new();
    for points in paths.visible_polylines() {
        shapes.push(Shape::line(points.to_vec(), Stroke::new(pen.width, pen.color)));
        shapes.extend(
            round_vertices(points)
                .into_iter()
                .map(|p| Shape::circle_filled(p, radius, pen.color)),
        );
    }
    shapes
}

pub fn paint_paths(painter: &Painter, paths: &PathCollection, pen: PenStyle) {
    painter.extend(stroke_shapes(paths, pen));
}

// Consecutive duplicates would stack alpha on the same disc.
fn round_vertices(points: &[Pos2]) -> Vec<Pos2> {
    let mut out: Vec<Pos2> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}
