//! A terminal stand-in for the map engine.
//!
//! Annotations are kept in a list that is printed under the metric panel.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};

use console::style;
use location_insight_markers::{Annotation, AnnotationHandle, MapProvider, MarkerError};

type Placed = Arc<Mutex<BTreeMap<u64, Annotation>>>;

#[derive(Debug, Default)]
pub struct ConsoleMap {
    placed: Placed,
    next_serial: u64,
}

struct ConsoleAnnotation {
    serial: u64,
    placed: Placed,
}

impl AnnotationHandle for ConsoleAnnotation {
    fn destroy(self: Box<Self>) {
        let removed = self
            .placed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.serial);
        if let Some(annotation) = removed {
            log::debug!("- [{}] {}", annotation.tag, annotation.label);
        }
    }
}

impl MapProvider for ConsoleMap {
    fn is_ready(&self) -> bool {
        true
    }

    fn add_annotation(
        &mut self,
        annotation: &Annotation,
    ) -> Result<Box<dyn AnnotationHandle>, MarkerError> {
        self.next_serial += 1;
        log::debug!("+ [{}] {}", annotation.tag, annotation.label);
        self.placed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.next_serial, annotation.clone());
        Ok(Box::new(ConsoleAnnotation {
            serial: self.next_serial,
            placed: Arc::clone(&self.placed),
        }))
    }
}

impl ConsoleMap {
    /// Lists the annotations currently on the map, grouped by tag.
    #[must_use]
    pub fn render(&self) -> String {
        let placed = self.placed.lock().unwrap_or_else(PoisonError::into_inner);
        let mut annotations: Vec<&Annotation> = placed.values().collect();
        annotations.sort_by(|a, b| a.tag.cmp(&b.tag).then_with(|| a.label.cmp(&b.label)));

        let mut out = String::new();
        let _ = writeln!(out, "{}", style(format!("Map ({} places)", annotations.len())).underlined());
        for annotation in annotations {
            let _ = writeln!(
                out,
                "  {:<12} {}  {}",
                annotation.tag.label(),
                annotation.label,
                style(annotation.coordinates).dim()
            );
        }
        out
    }
}
