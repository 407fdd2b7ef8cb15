use crate::draw::model::PathCollection;
use eframe::egui::{self, PointerButton, Pos2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerSample {
    Press { button: PointerButton, pos: Pos2 },
    Move { pos: Pos2, primary_down: bool },
    Release { button: PointerButton, pos: Pos2 },
}

/// Routes pointer samples from the overlay surface onto the path collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawInput {
    paths: PathCollection,
    blocked: bool,
}

impl DrawInput {
    pub fn paths(&self) -> &PathCollection {
        &self.paths
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// While blocked (a modal dialog is open) pointer samples are ignored and
    /// any stroke in progress is finished.
    pub fn set_blocked(&mut self, blocked: bool) {
        if blocked && !self.blocked {
            self.paths.end_stroke();
        }
        self.blocked = blocked;
    }

    /// Apply one sample. Returns `true` when the surface needs a repaint.
    pub fn handle(&mut self, sample: PointerSample) -> bool {
        if self.blocked {
            return false;
        }
        match sample {
            PointerSample::Press {
                button: PointerButton::Primary,
                pos,
            } => {
                self.paths.begin_stroke(pos);
                true
            }
            PointerSample::Move {
                pos,
                primary_down: true,
            } => self.paths.extend_stroke(pos),
            PointerSample::Release {
                button: PointerButton::Primary,
                ..
            } => self.paths.end_stroke(),
            _ => false,
        }
    }

    /// Translate this frame's raw egui events into samples and apply them.
    pub fn handle_events(&mut self, events: &[egui::Event], primary_down: bool) -> bool {
        let mut repaint = false;
        for sample in samples_from_events(events, primary_down) {
            repaint |= self.handle(sample);
        }
        repaint
    }
}

pub fn samples_from_events(events: &[egui::Event], primary_down: bool) -> Vec<PointerSample> {
    let mut held = primary_down;
    let mut samples = Vec::new();
    for event in events {
        match *event {
            egui::Event::PointerButton {
                pos,
                button,
                pressed: true,
                ..
            } => {
                if button == PointerButton::Primary {
                    held = true;
                }
                samples.push(PointerSample::Press { button, pos });
            }
            egui::Event::PointerButton {
                pos,
                button,
                pressed: false,
                ..
            } => {
                if button == PointerButton::Primary {
                    held = false;
                }
                samples.push(PointerSample::Release { button, pos });
            }
            egui::Event::PointerMoved(pos) => samples.push(PointerSample::Move {
                pos,
                primary_down: held,
            }),
            _ => {}
        }
    }
    samples
}
