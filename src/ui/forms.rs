use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Coordinate, Place, PlaceId};

/// Single-field dialog used both to name a new place and to rename one.
#[derive(Clone, Debug)]
pub(crate) struct PlaceForm {
    pub(crate) name: String,
    /// Used when the field is left blank.
    pub(crate) default_name: String,
    pub(crate) coordinate: Coordinate,
    pub(crate) error: Option<String>,
}

impl PlaceForm {
    /// Start with the suggested name already typed in, cursor at the end.
    pub(crate) fn with_suggestion(coordinate: Coordinate, suggestion: String) -> Self {
        Self {
            name: suggestion.clone(),
            default_name: suggestion,
            coordinate,
            error: None,
        }
    }

    pub(crate) fn from_place(place: &Place) -> Self {
        Self::with_suggestion(place.coordinate(), place.name.clone())
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            false
        } else {
            self.name.push(ch);
            true
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }

    pub(crate) fn clear(&mut self) {
        self.name.clear();
    }

    /// Name to persist: the trimmed input, or the default when it is blank.
    pub(crate) fn resolved_name(&self) -> String {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            self.default_name.trim().to_string()
        } else {
            trimmed.to_string()
        }
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        let (display, style) = if self.name.is_empty() {
            (
                self.default_name.clone(),
                Style::default().fg(Color::DarkGray),
            )
        } else {
            (self.name.clone(), Style::default().fg(Color::Yellow))
        };

        Line::from(vec![Span::raw("Name: "), Span::styled(display, style)])
    }

    pub(crate) fn value_len(&self) -> usize {
        self.name.chars().count()
    }
}

/// Pending single delete awaiting confirmation.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmPlaceDelete {
    pub(crate) id: PlaceId,
    pub(crate) name: String,
}

impl ConfirmPlaceDelete {
    pub(crate) fn new(place: &Place) -> Self {
        Self {
            id: place.id,
            name: place.name.clone(),
        }
    }
}

/// Pending wipe of the whole list.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmClearAll {
    pub(crate) count: usize,
}
