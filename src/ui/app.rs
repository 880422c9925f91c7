use std::mem;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::KeyCode;
use log::{error, info};
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Map, MapResolution, Points};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::db::PlaceStore;
use crate::geocode::{fallback_name, suggest_name, ReverseGeocoder};
use crate::models::{NewPlace, Place, PlaceId};

use super::forms::{ConfirmClearAll, ConfirmPlaceDelete, PlaceForm};
use super::helpers::{centered_rect, surface_error, truncate_label};
use super::screens::{MapOutcome, MapRequest, MapScreen, PlacesScreen, EMPTY_PLACEHOLDER};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Longest marker label drawn on the map.
const MARKER_LABEL_WIDTH: usize = 24;

/// High-level navigation states.
enum Screen {
    Places,
    Map(MapScreen),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    NamingPlace(PlaceForm),
    RenamingPlace { id: PlaceId, form: PlaceForm },
    ConfirmDelete(ConfirmPlaceDelete),
    ConfirmClearAll(ConfirmClearAll),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    store: PlaceStore,
    geocoder: Box<dyn ReverseGeocoder>,
    places: PlacesScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Build the app and load the list for its first appearance.
    pub fn new(store: PlaceStore, geocoder: Box<dyn ReverseGeocoder>) -> Result<Self> {
        let places = store.get_all().context("failed to load places")?;
        Ok(Self {
            store,
            geocoder,
            places: PlacesScreen::new(places),
            screen: Screen::Places,
            mode: Mode::Normal,
            status: None,
        })
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::NamingPlace(form) => self.handle_naming(code, form)?,
            Mode::RenamingPlace { id, form } => self.handle_renaming(code, id, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::ConfirmClearAll(confirm) => self.handle_confirm_clear(code, confirm)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Places => self.handle_places_key(code, exit),
            Screen::Map(_) => self.handle_map_key(code),
        }
    }

    fn handle_places_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.places.move_selection(-1),
            KeyCode::Down => self.places.move_selection(1),
            KeyCode::Home => self.places.select_first(),
            KeyCode::End => self.places.select_last(),
            KeyCode::Char('a') | KeyCode::Char('+') => {
                self.clear_status();
                self.open_map(MapRequest::AddNew);
            }
            KeyCode::Enter => {
                if let Some(place) = self.places.current_place().cloned() {
                    self.clear_status();
                    self.open_map(MapRequest::Browse { focus: Some(place) });
                }
            }
            KeyCode::Char('m') => {
                self.clear_status();
                self.open_map(MapRequest::Browse { focus: None });
            }
            KeyCode::Char('r') => {
                if let Some(place) = self.places.current_place() {
                    return Ok(Mode::RenamingPlace {
                        id: place.id,
                        form: PlaceForm::from_place(place),
                    });
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(place) = self.places.current_place() {
                    return Ok(Mode::ConfirmDelete(ConfirmPlaceDelete::new(place)));
                }
            }
            KeyCode::Char('X') => {
                if !self.places.is_empty() {
                    return Ok(Mode::ConfirmClearAll(ConfirmClearAll {
                        count: self.places.places().len(),
                    }));
                }
            }
            KeyCode::Char('o') => {
                if let Some(place) = self.places.current_place().cloned() {
                    self.open_in_browser(&place);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_map_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Screen::Map(map) = &mut self.screen else {
            return Ok(Mode::Normal);
        };

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.leave_map(),
            KeyCode::Left | KeyCode::Char('h') => map.viewport.pan(-1, 0),
            KeyCode::Right | KeyCode::Char('l') => map.viewport.pan(1, 0),
            KeyCode::Up | KeyCode::Char('k') => map.viewport.pan(0, 1),
            KeyCode::Down | KeyCode::Char('j') => map.viewport.pan(0, -1),
            KeyCode::Char('+') | KeyCode::Char('=') => map.viewport.zoom_in(),
            KeyCode::Char('-') => map.viewport.zoom_out(),
            KeyCode::Enter => {
                let coordinate = map.pointer();
                let suggestion = suggest_name(self.geocoder.as_ref(), coordinate, &Local::now());
                return Ok(Mode::NamingPlace(PlaceForm::with_suggestion(
                    coordinate, suggestion,
                )));
            }
            KeyCode::Char('n') => {
                let coordinate = map.pointer();
                return Ok(Mode::NamingPlace(PlaceForm::with_suggestion(
                    coordinate,
                    fallback_name(&Local::now()),
                )));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_naming(&mut self, code: KeyCode, mut form: PlaceForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Add place cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_place(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => {
                    error!("failed to save place: {err:#}");
                    form.error = Some(surface_error(&err));
                    self.set_status("Error saving place", StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::NamingPlace(form))
    }

    fn handle_renaming(&mut self, code: KeyCode, id: PlaceId, mut form: PlaceForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Rename cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_renamed_place(id, &form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::RenamingPlace { id, form })
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmPlaceDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_confirm_clear(&mut self, code: KeyCode, confirm: ConfirmClearAll) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_clear() {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmClearAll(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmClearAll(confirm)),
        }
    }

    fn open_map(&mut self, request: MapRequest) {
        match self.store.get_all().context("failed to load places") {
            Ok(markers) => self.screen = Screen::Map(MapScreen::new(request, markers)),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    /// Close the map and refresh the list, focusing the newest save if any.
    fn leave_map(&mut self) {
        let previous = mem::replace(&mut self.screen, Screen::Places);
        let outcome = match previous {
            Screen::Map(map) => map.outcome(),
            Screen::Places => MapOutcome::default(),
        };

        if outcome.changed {
            info!("map closed with new places, refreshing list");
        }
        if let Err(err) = self.reload_places(outcome.last_added) {
            self.set_status(surface_error(&err), StatusKind::Error);
        }
    }

    fn save_new_place(&mut self, form: &PlaceForm) -> Result<()> {
        let name = form.resolved_name();
        let new_place = NewPlace::at(name.clone(), form.coordinate);
        let id = self.store.add(&new_place).context("failed to save place")?;
        info!("saved place {id} at {}", form.coordinate);

        if let Screen::Map(map) = &mut self.screen {
            map.record_added(new_place.with_id(id));
        }
        self.set_status(format!("Place added: {name}"), StatusKind::Info);
        Ok(())
    }

    fn save_renamed_place(&mut self, id: PlaceId, form: &PlaceForm) -> Result<()> {
        let place = Place {
            id,
            name: form.resolved_name(),
            latitude: form.coordinate.latitude,
            longitude: form.coordinate.longitude,
        };
        let updated = self.store.update(&place).context("failed to rename place")?;
        self.reload_places(Some(id))?;
        if updated == 0 {
            self.set_status("Place no longer exists.", StatusKind::Error);
        } else {
            self.set_status(format!("Renamed to {}.", place.name), StatusKind::Info);
        }
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmPlaceDelete) -> Result<()> {
        self.store
            .delete_by_id(confirm.id)
            .context("failed to delete place")?;
        info!("deleted place {} ({})", confirm.id, confirm.name);
        self.reload_places(None)?;
        self.set_status("Place deleted", StatusKind::Info);
        Ok(())
    }

    fn perform_clear(&mut self) -> Result<()> {
        let removed = self.store.delete_all().context("failed to delete places")?;
        info!("deleted all {removed} place(s)");
        self.reload_places(None)?;
        self.set_status(format!("Deleted {removed} place(s)."), StatusKind::Info);
        Ok(())
    }

    fn reload_places(&mut self, focus: Option<PlaceId>) -> Result<()> {
        let places = self.store.get_all().context("failed to load places")?;
        self.places.set_places(places, focus);
        Ok(())
    }

    fn open_in_browser(&mut self, place: &Place) {
        let url = place.coordinate().osm_url();
        match open_link(&url) {
            Ok(()) => self.set_status(format!("Opened {} in browser.", place.name), StatusKind::Info),
            Err(err) => {
                error!("failed to open {url}: {err}");
                self.set_status(format!("Could not open browser: {err}"), StatusKind::Error);
            }
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Places => self.draw_places(frame, content_area),
            Screen::Map(map) => self.draw_map(frame, content_area, map),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::NamingPlace(form) => self.draw_place_form(frame, area, "Add Favorite Place", form),
            Mode::RenamingPlace { form, .. } => {
                self.draw_place_form(frame, area, "Rename Place", form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm(
                frame,
                area,
                "Delete Place",
                format!("Delete \"{}\"?", confirm.name),
            ),
            Mode::ConfirmClearAll(confirm) => self.draw_confirm(
                frame,
                area,
                "Delete All Places",
                format!("Delete all {} saved place(s)?", confirm.count),
            ),
            Mode::Normal => {}
        }
    }

    fn draw_places(&self, frame: &mut Frame, area: Rect) {
        let title = format!("Favorite Places ({})", self.places.places().len());
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.places.is_empty() {
            let placeholder = List::new(vec![ListItem::new(Span::styled(
                EMPTY_PLACEHOLDER,
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ))])
            .block(block);
            frame.render_widget(placeholder, area);
            return;
        }

        let items: Vec<ListItem> = self
            .places
            .places()
            .iter()
            .map(|place| {
                ListItem::new(Line::from(vec![
                    Span::raw(place.name.clone()),
                    Span::styled(
                        format!("  ({})", place.coordinate()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.places.selected()));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_map(&self, frame: &mut Frame, area: Rect, map: &MapScreen) {
        let title = match &map.focus {
            Some(place) => format!("Map - {} ({})", place.name, map.pointer()),
            None => format!("Map ({})", map.pointer()),
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        let (x_bounds, y_bounds) = map.viewport.bounds(inner.width, inner.height);
        let pointer = map.pointer();
        let focus_id = map.focus.as_ref().map(|place| place.id);

        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| {
                ctx.draw(&Map {
                    color: Color::Green,
                    resolution: MapResolution::High,
                });
                ctx.layer();

                let coords: Vec<(f64, f64)> = map
                    .markers
                    .iter()
                    .map(|place| (place.longitude, place.latitude))
                    .collect();
                ctx.draw(&Points {
                    coords: &coords,
                    color: Color::Red,
                });

                for place in &map.markers {
                    let style = if Some(place.id) == focus_id {
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    ctx.print(
                        place.longitude,
                        place.latitude,
                        Span::styled(
                            format!("• {}", truncate_label(&place.name, MARKER_LABEL_WIDTH)),
                            style,
                        ),
                    );
                }

                ctx.print(
                    pointer.longitude,
                    pointer.latitude,
                    Span::styled(
                        "+",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                );
            });

        frame.render_widget(canvas, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let pairs: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::NamingPlace(_)) | (_, Mode::RenamingPlace { .. }) => {
                &[("[Enter]", " Save   "), ("[Esc]", " Cancel")]
            }
            (_, Mode::ConfirmDelete(_)) | (_, Mode::ConfirmClearAll(_)) => {
                &[("[y]", " Confirm   "), ("[n]", " Cancel")]
            }
            (Screen::Places, Mode::Normal) if self.places.is_empty() => &[
                ("[a]", " Add place   "),
                ("[m]", " Map   "),
                ("[q]", " Quit"),
            ],
            (Screen::Places, Mode::Normal) => &[
                ("[↑↓]", " Navigate   "),
                ("[Enter]", " Show on map   "),
                ("[a]", " Add   "),
                ("[r]", " Rename   "),
                ("[d]", " Delete   "),
                ("[X]", " Delete all   "),
                ("[o]", " Browser   "),
                ("[q]", " Quit"),
            ],
            (Screen::Map(_), Mode::Normal) => &[
                ("[←↑↓→]", " Pan   "),
                ("[+/-]", " Zoom   "),
                ("[Enter]", " Add here   "),
                ("[n]", " Quick add   "),
                ("[Esc]", " Back"),
            ],
        };

        let spans: Vec<Span<'static>> = pairs
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_place_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &PlaceForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line(),
            Line::from(Span::styled(
                format!("Location: {}", form.coordinate),
                Style::default().fg(Color::Gray),
            )),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Esc to cancel • blank keeps the suggestion",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = "Name: ".len() as u16;
        let cursor_x = (inner.x + prefix + form.value_len() as u16)
            .min(inner.x + inner.width.saturating_sub(1));
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, question: String) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        let lines = vec![
            Line::from(question),
            Line::from(""),
            Line::from(Span::styled(
                "y to confirm • n or Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use anyhow::anyhow;

    use super::*;
    use crate::geocode::OfflineGeocoder;
    use crate::models::Coordinate;
    use crate::ui::screens::DEFAULT_CENTER;

    struct Counting {
        calls: Rc<Cell<usize>>,
        answer: Option<&'static str>,
    }

    impl ReverseGeocoder for Counting {
        fn reverse(&self, _coordinate: Coordinate) -> Result<Option<String>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.answer.map(str::to_string))
        }
    }

    struct Failing;

    impl ReverseGeocoder for Failing {
        fn reverse(&self, _coordinate: Coordinate) -> Result<Option<String>> {
            Err(anyhow!("no network"))
        }
    }

    fn app_with(geocoder: Box<dyn ReverseGeocoder>) -> App {
        App::new(PlaceStore::open_in_memory().unwrap(), geocoder).unwrap()
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            assert!(!app.handle_key(*key).unwrap());
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn list_names(app: &App) -> Vec<String> {
        app.places.places().iter().map(|p| p.name.clone()).collect()
    }

    fn status_text(app: &App) -> Option<&str> {
        app.status.as_ref().map(|s| s.text.as_str())
    }

    #[test]
    fn placeholder_is_not_a_record() {
        let mut app = app_with(Box::new(OfflineGeocoder));
        press(
            &mut app,
            &[KeyCode::Enter, KeyCode::Char('d'), KeyCode::Char('r'), KeyCode::Char('X')],
        );
        assert!(matches!(app.screen, Screen::Places));
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.store.count().unwrap(), 0);
    }

    #[test]
    fn long_press_add_uses_geocoded_name_and_signals_change() {
        let calls = Rc::new(Cell::new(0));
        let mut app = app_with(Box::new(Counting {
            calls: calls.clone(),
            answer: Some("100 Queen St W, Toronto"),
        }));

        press(&mut app, &[KeyCode::Char('a'), KeyCode::Enter]);
        assert_eq!(calls.get(), 1);
        match &app.mode {
            Mode::NamingPlace(form) => {
                assert_eq!(form.name, "100 Queen St W, Toronto");
                assert_eq!(form.coordinate, DEFAULT_CENTER);
            }
            _ => panic!("naming dialog should be open"),
        }

        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(status_text(&app), Some("Place added: 100 Queen St W, Toronto"));
        match &app.screen {
            Screen::Map(map) => {
                assert!(map.outcome().changed);
                assert_eq!(map.markers.len(), 1);
            }
            Screen::Places => panic!("map should stay open after saving"),
        }

        press(&mut app, &[KeyCode::Esc]);
        assert!(matches!(app.screen, Screen::Places));
        assert_eq!(list_names(&app), ["100 Queen St W, Toronto"]);
    }

    #[test]
    fn failing_geocoder_offers_timestamp_name() {
        let mut app = app_with(Box::new(Failing));
        press(&mut app, &[KeyCode::Char('a'), KeyCode::Enter]);
        match &app.mode {
            Mode::NamingPlace(form) => {
                assert!(!form.name.is_empty());
                assert_eq!(form.name, form.default_name);
            }
            _ => panic!("naming dialog should be open"),
        }
    }

    #[test]
    fn quick_add_skips_geocoder_and_accepts_typed_name() {
        let calls = Rc::new(Cell::new(0));
        let mut app = app_with(Box::new(Counting {
            calls: calls.clone(),
            answer: Some("unused"),
        }));

        press(&mut app, &[KeyCode::Char('a'), KeyCode::Right, KeyCode::Char('n')]);
        assert_eq!(calls.get(), 0);

        if let Mode::NamingPlace(form) = &mut app.mode {
            form.clear();
        }
        type_text(&mut app, "Home");
        press(&mut app, &[KeyCode::Enter, KeyCode::Esc]);

        let places = app.store.get_all().unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Home");
        assert!(places[0].longitude > DEFAULT_CENTER.longitude);
    }

    #[test]
    fn cancelled_dialog_leaves_outcome_unchanged() {
        let mut app = app_with(Box::new(OfflineGeocoder));
        press(&mut app, &[KeyCode::Char('a'), KeyCode::Char('n'), KeyCode::Esc]);
        match &app.screen {
            Screen::Map(map) => assert!(!map.outcome().changed),
            Screen::Places => panic!("map should still be open"),
        }
        assert_eq!(app.store.count().unwrap(), 0);
    }

    #[test]
    fn delete_requires_confirmation_and_refreshes() {
        let store = PlaceStore::open_in_memory().unwrap();
        for name in ["A", "B", "C"] {
            store.add(&NewPlace::new(name, 1.0, 1.0)).unwrap();
        }
        let mut app = App::new(store, Box::new(OfflineGeocoder)).unwrap();
        assert_eq!(list_names(&app), ["C", "B", "A"]);

        press(&mut app, &[KeyCode::Down, KeyCode::Char('d'), KeyCode::Char('n')]);
        assert_eq!(app.store.count().unwrap(), 3);

        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('y')]);
        assert_eq!(list_names(&app), ["C", "A"]);
        assert_eq!(status_text(&app), Some("Place deleted"));
    }

    #[test]
    fn rename_updates_row() {
        let store = PlaceStore::open_in_memory().unwrap();
        store.add(&NewPlace::new("Old", 1.0, 2.0)).unwrap();
        let mut app = App::new(store, Box::new(OfflineGeocoder)).unwrap();

        press(&mut app, &[KeyCode::Char('r')]);
        press(&mut app, &[KeyCode::Backspace, KeyCode::Backspace, KeyCode::Backspace]);
        type_text(&mut app, "New");
        press(&mut app, &[KeyCode::Enter]);

        assert_eq!(list_names(&app), ["New"]);
        let saved = &app.store.get_all().unwrap()[0];
        assert_eq!((saved.latitude, saved.longitude), (1.0, 2.0));
    }

    #[test]
    fn clear_all_after_confirmation() {
        let store = PlaceStore::open_in_memory().unwrap();
        store.add(&NewPlace::new("A", 1.0, 1.0)).unwrap();
        store.add(&NewPlace::new("B", 1.0, 1.0)).unwrap();
        let mut app = App::new(store, Box::new(OfflineGeocoder)).unwrap();

        press(&mut app, &[KeyCode::Char('X'), KeyCode::Char('y')]);
        assert!(app.places.is_empty());
        assert_eq!(status_text(&app), Some("Deleted 2 place(s)."));
    }

    #[test]
    fn enter_on_place_browses_map_centred_on_it() {
        let store = PlaceStore::open_in_memory().unwrap();
        store.add(&NewPlace::new("Cafe", 43.65, -79.38)).unwrap();
        let mut app = App::new(store, Box::new(OfflineGeocoder)).unwrap();

        press(&mut app, &[KeyCode::Enter]);
        match &app.screen {
            Screen::Map(map) => {
                assert_eq!(map.pointer(), Coordinate::new(43.65, -79.38));
                assert_eq!(map.focus.as_ref().map(|p| p.name.as_str()), Some("Cafe"));
            }
            Screen::Places => panic!("map should be open"),
        }
    }

    #[test]
    fn failed_save_keeps_dialog_open_and_map_unchanged() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("places.db");
        let store = PlaceStore::open(&path).unwrap();
        let mut app = App::new(store, Box::new(OfflineGeocoder)).unwrap();

        press(&mut app, &[KeyCode::Char('a'), KeyCode::Char('n')]);
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE places")
            .unwrap();
        press(&mut app, &[KeyCode::Enter]);

        assert_eq!(status_text(&app), Some("Error saving place"));
        match &app.mode {
            Mode::NamingPlace(form) => assert!(form.error.is_some()),
            _ => panic!("naming dialog should stay open"),
        }
        match &app.screen {
            Screen::Map(map) => {
                assert!(!map.outcome().changed);
                assert_eq!(map.outcome().last_added, None);
                assert!(map.markers.is_empty());
            }
            Screen::Places => panic!("map should still be open"),
        }
    }

    #[test]
    fn quit_from_list() {
        let mut app = app_with(Box::new(OfflineGeocoder));
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn draws_every_screen() {
        use ratatui::backend::TestBackend;
        use ratatui::Terminal;

        let store = PlaceStore::open_in_memory().unwrap();
        store.add(&NewPlace::new("Cafe", 43.65, -79.38)).unwrap();
        let mut app = App::new(store, Box::new(OfflineGeocoder)).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        terminal.draw(|frame| app.draw(frame)).unwrap();
        press(&mut app, &[KeyCode::Enter]);
        terminal.draw(|frame| app.draw(frame)).unwrap();
        press(&mut app, &[KeyCode::Char('n')]);
        terminal.draw(|frame| app.draw(frame)).unwrap();
    }
}
