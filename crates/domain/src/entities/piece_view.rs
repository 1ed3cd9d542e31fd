use serde::Serialize;
use std::fmt;

/// Download state of a single piece, before any reader overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Completion {
    #[default]
    Empty,
    Loading,
    Complete,
}

/// Combined classification of a piece. Completion and the reader tags are
/// independent, so a piece can be complete and inside a reader window at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceClass {
    pub completion: Completion,
    /// Exact position of at least one reader.
    pub reader: bool,
    /// Inside the window of at least one reader that is not positioned here.
    pub in_reader_range: bool,
}

impl PieceClass {
    pub fn is_empty(&self) -> bool {
        self.completion == Completion::Empty
    }

    pub fn is_loading(&self) -> bool {
        self.completion == Completion::Loading
    }

    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }
}

impl fmt::Display for PieceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.completion {
            Completion::Empty => "empty",
            Completion::Loading => "loading",
            Completion::Complete => "complete",
        };
        f.write_str(base)?;
        if self.reader {
            f.write_str(" reader")?;
        }
        if self.in_reader_range {
            f.write_str(" reader-range")?;
        }
        Ok(())
    }
}

/// Render-ready state of one piece.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceView {
    pub index: usize,
    pub class: PieceClass,
    /// Present only when the backend has a record for this piece.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

impl PieceView {
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            class: PieceClass::default(),
            percentage: None,
        }
    }

    pub fn percentage_label(&self) -> Option<String> {
        self.percentage.map(|p| format!("{:.2}", p))
    }

    pub fn class_label(&self) -> String {
        self.class.to_string()
    }
}

/// Aggregate counts over a derived piece map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceMapSummary {
    pub total: usize,
    pub complete: usize,
    pub loading: usize,
    pub empty: usize,
    pub reader_positions: usize,
    pub in_reader_range: usize,
}

impl PieceMapSummary {
    pub fn complete_ratio(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.complete as f32 / self.total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_label_lists_tags_in_order() {
        let class = PieceClass {
            completion: Completion::Complete,
            reader: true,
            in_reader_range: true,
        };
        assert_eq!(class.to_string(), "complete reader reader-range");
        assert_eq!(PieceClass::default().to_string(), "empty");
    }

    #[test]
    fn percentage_label_uses_two_decimals() {
        let view = PieceView {
            index: 0,
            class: PieceClass::default(),
            percentage: Some(50.0),
        };
        assert_eq!(view.percentage_label().as_deref(), Some("50.00"));
        assert_eq!(PieceView::empty(1).percentage_label(), None);
    }
}
