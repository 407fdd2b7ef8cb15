pub mod capture;
pub mod controller;
pub mod draw;
pub mod gemini;
pub mod gui;
pub mod logging;
pub mod markdown;
pub mod settings;
pub mod typewriter;
