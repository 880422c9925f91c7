use crate::models::{Coordinate, Place, PlaceId};

/// Map centre used when no place is being browsed (Toronto city hall).
pub(crate) const DEFAULT_CENTER: Coordinate = Coordinate {
    latitude: 43.6532,
    longitude: -79.3832,
};
/// Longitude degrees visible at city zoom.
pub(crate) const CITY_SPAN: f64 = 0.4;
/// Longitude degrees visible when zoomed onto a single place.
pub(crate) const STREET_SPAN: f64 = 0.02;
const MIN_SPAN: f64 = 0.001;
const MAX_SPAN: f64 = 360.0;
/// Fraction of the visible span moved per arrow key press.
const PAN_FRACTION: f64 = 0.1;
/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;

/// Text shown in the list when the store is empty. It is never backed by a
/// record and cannot be selected.
pub(crate) const EMPTY_PLACEHOLDER: &str = "Add a new place...";

/// List of saved places as last fetched from the store.
pub(crate) struct PlacesScreen {
    places: Vec<Place>,
    selected: usize,
}

impl PlacesScreen {
    pub(crate) fn new(places: Vec<Place>) -> Self {
        Self {
            places,
            selected: 0,
        }
    }

    pub(crate) fn places(&self) -> &[Place] {
        &self.places
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub(crate) fn selected(&self) -> usize {
        self.selected
    }

    /// Selected record. `None` while only the placeholder is shown.
    pub(crate) fn current_place(&self) -> Option<&Place> {
        self.places.get(self.selected)
    }

    /// Replace the rows, keeping the selection on `focus` when it is still
    /// present and otherwise clamping it into range.
    pub(crate) fn set_places(&mut self, places: Vec<Place>, focus: Option<PlaceId>) {
        self.places = places;
        if let Some(id) = focus {
            if let Some(idx) = self.places.iter().position(|p| p.id == id) {
                self.selected = idx;
                return;
            }
        }
        self.ensure_in_bounds();
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.places.is_empty() {
            self.selected = 0;
            return;
        }
        let max = self.places.len() as isize - 1;
        let next = (self.selected as isize + offset).clamp(0, max);
        self.selected = next as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.places.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.selected >= self.places.len() {
            self.selected = self.places.len().saturating_sub(1);
        }
    }
}

/// How the map was entered from the list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MapRequest {
    /// Look around, optionally centred on one saved place.
    Browse { focus: Option<Place> },
    /// Open straight away for picking a new place.
    AddNew,
}

/// What the list needs to know once the map closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct MapOutcome {
    /// At least one place was saved while the map was open.
    pub(crate) changed: bool,
    /// Id of the last place saved, used to focus it in the list.
    pub(crate) last_added: Option<PlaceId>,
}

/// Visible window onto the world map. The centre doubles as the pointer the
/// user adds places at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) center: Coordinate,
    /// Longitude degrees across the full width.
    pub(crate) span: f64,
}

impl Viewport {
    pub(crate) fn new(center: Coordinate, span: f64) -> Self {
        Self {
            center,
            span: span.clamp(MIN_SPAN, MAX_SPAN),
        }
    }

    /// Move the centre by whole pan steps. Latitude stops at the poles,
    /// longitude wraps around the antimeridian.
    pub(crate) fn pan(&mut self, steps_east: i32, steps_north: i32) {
        let step = self.span * PAN_FRACTION;
        let latitude = (self.center.latitude + f64::from(steps_north) * step).clamp(-90.0, 90.0);
        let mut longitude = self.center.longitude + f64::from(steps_east) * step;
        if longitude > 180.0 {
            longitude -= 360.0;
        } else if longitude < -180.0 {
            longitude += 360.0;
        }
        self.center = Coordinate::new(latitude, longitude);
    }

    pub(crate) fn zoom_in(&mut self) {
        self.span = (self.span / 2.0).max(MIN_SPAN);
    }

    pub(crate) fn zoom_out(&mut self) {
        self.span = (self.span * 2.0).min(MAX_SPAN);
    }

    /// Canvas bounds for an area `width` x `height` cells: `(x, y)` where x is
    /// longitude and y latitude.
    pub(crate) fn bounds(&self, width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
        let half_x = self.span / 2.0;
        let ratio = if width == 0 {
            1.0
        } else {
            f64::from(height) * CELL_ASPECT / f64::from(width)
        };
        let half_y = half_x * ratio;
        (
            [self.center.longitude - half_x, self.center.longitude + half_x],
            [self.center.latitude - half_y, self.center.latitude + half_y],
        )
    }
}

/// State of the map screen while it is open.
pub(crate) struct MapScreen {
    pub(crate) markers: Vec<Place>,
    pub(crate) viewport: Viewport,
    pub(crate) focus: Option<Place>,
    outcome: MapOutcome,
}

impl MapScreen {
    pub(crate) fn new(request: MapRequest, markers: Vec<Place>) -> Self {
        let (viewport, focus) = match request {
            MapRequest::Browse { focus: Some(place) } => {
                (Viewport::new(place.coordinate(), STREET_SPAN), Some(place))
            }
            MapRequest::Browse { focus: None } | MapRequest::AddNew => {
                (Viewport::new(DEFAULT_CENTER, CITY_SPAN), None)
            }
        };

        Self {
            markers,
            viewport,
            focus,
            outcome: MapOutcome::default(),
        }
    }

    pub(crate) fn pointer(&self) -> Coordinate {
        self.viewport.center
    }

    /// Record a successful save and show its marker immediately.
    pub(crate) fn record_added(&mut self, place: Place) {
        self.outcome.changed = true;
        self.outcome.last_added = Some(place.id);
        self.markers.insert(0, place);
    }

    pub(crate) fn outcome(&self) -> MapOutcome {
        self.outcome
    }
}
