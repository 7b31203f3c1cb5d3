use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::indicator::{Frame, Indicator};

/// A surface the panel renders device state onto.
pub trait View {
    fn show(&mut self, frame: &Frame);
}

// Lets a caller keep a handle on a view that a session renders into.
impl<V: View> View for Arc<Mutex<V>> {
    fn show(&mut self, frame: &Frame) {
        match self.lock() {
            Ok(mut view) => view.show(frame),
            Err(e) => log::error!("view is poisoned: {}", e),
        }
    }
}

/// Model of the panel header: a class list plus the "now showing" title.
#[derive(Clone, Debug, Default)]
pub struct HeaderView {
    classes: BTreeSet<String>,
    title: String,
    updates: usize,
}

impl HeaderView {
    pub fn new() -> HeaderView {
        return HeaderView::default();
    }

    /// Starts out with classes that have nothing to do with the indicator.
    pub fn with_classes(classes: &[&str]) -> HeaderView {
        let mut view = HeaderView::default();
        view.classes = classes.iter().map(|c| c.to_string()).collect();
        return view;
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// The indicator classes currently set on the header.
    pub fn indicator_classes(&self) -> Vec<&'static str> {
        Indicator::CLASSES
            .iter()
            .copied()
            .filter(|c| self.classes.contains(*c))
            .collect()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// How many frames have been shown.
    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl View for HeaderView {
    fn show(&mut self, frame: &Frame) {
        for class in Indicator::CLASSES {
            self.classes.remove(class);
        }
        if let Some(class) = frame.indicator.class() {
            self.classes.insert(class.to_string());
        }
        self.title = frame.title.clone();
        self.updates += 1;
    }
}

/// Prints a line to stdout whenever the displayed frame changes.
#[derive(Debug, Default)]
pub struct TerminalView {
    last: Option<Frame>,
}

impl TerminalView {
    pub fn new() -> TerminalView {
        return TerminalView { last: None };
    }

    pub fn line(frame: &Frame) -> String {
        format!("[{}] {}", frame.indicator.label(), frame.title)
    }
}

impl View for TerminalView {
    fn show(&mut self, frame: &Frame) {
        if self.last.as_ref() == Some(frame) {
            return;
        }
        println!("{}", TerminalView::line(frame));
        self.last = Some(frame.clone());
    }
}
