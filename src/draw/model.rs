use eframe::egui::{Color32, Pos2};

/// One continuous freehand line from button press to button release.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stroke {
    points: Vec<Pos2>,
}

impl Stroke {
    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Strokes with fewer than two points render as nothing.
    pub fn is_visible(&self) -> bool {
        self.points.len() >= 2
    }
}

impl From<Vec<Pos2>> for Stroke {
    fn from(points: Vec<Pos2>) -> Self {
        Self { points }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenStyle {
    pub color: Color32,
    pub width: f32,
}

impl PenStyle {
    pub fn from_rgba(rgba: [u8; 4], width: f32) -> Self {
        let [r, g, b, a] = rgba;
        Self {
            color: Color32::from_rgba_unmultiplied(r, g, b, a),
            width: width.max(0.5),
        }
    }
}

impl Default for PenStyle {
    fn default() -> Self {
        Self::from_rgba([255, 0, 0, 200], 4.0)
    }
}

/// Completed strokes plus at most one stroke in progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathCollection {
    completed: Vec<Stroke>,
    in_progress: Option<Vec<Pos2>>,
}

impl PathCollection {
    pub fn completed(&self) -> &[Stroke] {
        &self.completed
    }

    pub fn in_progress(&self) -> Option<&[Pos2]> {
        self.in_progress.as_deref()
    }

    pub fn is_drawing(&self) -> bool {
        self.in_progress.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.in_progress.is_none()
    }

    pub fn begin_stroke(&mut self, point: Pos2) {
        self.in_progress = Some(vec![point]);
    }

    /// Append `point` to the stroke in progress. Returns `true` when a redraw
    /// is needed.
    pub fn extend_stroke(&mut self, point: Pos2) -> bool {
        match self.in_progress.as_mut() {
            Some(points) => {
                points.push(point);
                true
            }
            None => false,
        }
    }

    /// Move the stroke in progress into the completed list. Short strokes are
    /// kept as well.
    pub fn end_stroke(&mut self) -> bool {
        match self.in_progress.take() {
            Some(points) => {
                self.completed.push(Stroke::from(points));
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.completed.clear();
        self.in_progress = None;
    }

    /// Point lists that produce a visible line, completed strokes first and
    /// the stroke in progress last.
    pub fn visible_polylines(&self) -> impl Iterator<Item = &[Pos2]> {
        self.completed
            .iter()
            .map(Stroke::points)
            .chain(self.in_progress.as_deref())
            .filter(|points| points.len() >= 2)
    }
}
