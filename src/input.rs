use crate::app::{App, InputMode, SearchState};
use crossterm::event::{KeyCode, MouseButton, MouseEventKind};
use ratatui::layout::Rect;

/// What a key press or click asks the app to do. Handlers receive the
/// triggering symbol or control explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    AddSymbol(String),
    RemoveSymbol(String),
    ShowChart(String),
    SelectPeriod(&'static str),
    Predict,
    Search(String),
    CloseChart,
    Refresh,
}

pub fn handle_input(app: &mut App, key: KeyCode) -> Action {
    // A notification is modal: any key just dismisses it.
    if app.notification.take().is_some() {
        return Action::None;
    }

    match &mut app.input_mode {
        InputMode::Normal => match key {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('a') | KeyCode::Char('i') => {
                app.input_mode = InputMode::AddSymbol(String::new());
                Action::None
            }
            KeyCode::Char('/') => {
                app.input_mode = InputMode::Search(SearchState::default());
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.next_row();
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.prev_row();
                Action::None
            }
            KeyCode::Enter => match app.selected_symbol() {
                Some(symbol) if app.is_ready(symbol) => Action::ShowChart(symbol.clone()),
                _ => Action::None,
            },
            KeyCode::Char('d') | KeyCode::Delete => match app.selected_symbol() {
                Some(symbol) => Action::RemoveSymbol(symbol.clone()),
                None => Action::None,
            },
            KeyCode::Char(c @ '1'..='9') if app.chart_symbol.is_some() => {
                let idx = c as usize - '1' as usize;
                match app.periods.token_at(idx) {
                    Some(token) => Action::SelectPeriod(token),
                    None => Action::None,
                }
            }
            KeyCode::Char('p') if app.chart_symbol.is_some() && !app.predicting => Action::Predict,
            KeyCode::Esc if app.chart_symbol.is_some() => Action::CloseChart,
            KeyCode::Char('r') => Action::Refresh,
            _ => Action::None,
        },
        InputMode::AddSymbol(text) => match key {
            KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
                Action::None
            }
            KeyCode::Enter => {
                let text = std::mem::take(text);
                app.input_mode = InputMode::Normal;
                Action::AddSymbol(text)
            }
            KeyCode::Backspace => {
                text.pop();
                Action::None
            }
            KeyCode::Char(c) if !c.is_whitespace() || !text.is_empty() => {
                text.push(c);
                Action::None
            }
            _ => Action::None,
        },
        InputMode::Search(state) => match key {
            KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
                Action::None
            }
            KeyCode::Up => {
                state.selected = state.selected.saturating_sub(1);
                Action::None
            }
            KeyCode::Down => {
                if state.selected + 1 < state.results.len() {
                    state.selected += 1;
                }
                Action::None
            }
            KeyCode::Enter => {
                let fresh = state.searched.as_deref() == Some(state.query.trim());
                match state.results.get(state.selected) {
                    Some(result) if fresh => {
                        let symbol = result.symbol.clone();
                        app.input_mode = InputMode::Normal;
                        Action::AddSymbol(symbol)
                    }
                    _ if state.pending => Action::None,
                    _ => Action::Search(state.query.clone()),
                }
            }
            KeyCode::Backspace => {
                state.query.pop();
                Action::None
            }
            KeyCode::Char(c) => {
                state.query.push(c);
                Action::None
            }
            _ => Action::None,
        },
    }
}

/// Check if a point (x, y) is inside a Rect
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

pub fn handle_mouse(app: &mut App, kind: MouseEventKind, x: u16, y: u16) -> Action {
    if !matches!(kind, MouseEventKind::Down(MouseButton::Left)) {
        return Action::None;
    }

    if app.notification.take().is_some() {
        return Action::None;
    }
    if !matches!(app.input_mode, InputMode::Normal) {
        return Action::None;
    }

    let regions = &app.clickable_regions;

    // The remove control sits inside the card row, so it is checked first.
    for (rect, symbol) in &regions.remove_buttons {
        if point_in_rect(x, y, *rect) {
            return Action::RemoveSymbol(symbol.clone());
        }
    }

    let clicked_card = regions
        .cards
        .iter()
        .find(|(rect, _)| point_in_rect(x, y, *rect))
        .map(|(_, symbol)| symbol.clone());
    if let Some(symbol) = clicked_card {
        let row = app.watchlist.symbols().iter().position(|s| *s == symbol);
        app.table_state.select(row);
        if app.is_ready(&symbol) {
            return Action::ShowChart(symbol);
        }
        return Action::None;
    }

    for (rect, idx) in &regions.period_tabs {
        if point_in_rect(x, y, *rect) {
            return match app.periods.token_at(*idx) {
                Some(token) => Action::SelectPeriod(token),
                None => Action::None,
            };
        }
    }

    if let Some(rect) = regions.predict_button {
        if point_in_rect(x, y, rect) && !app.predicting {
            return Action::Predict;
        }
    }

    Action::None
}

/// Carry out an action. Returns `true` when the app should exit.
pub fn dispatch(app: &mut App, action: Action) -> bool {
    match action {
        Action::Quit => return true,
        Action::AddSymbol(text) => {
            app.add_symbol(&text);
        }
        Action::RemoveSymbol(symbol) => app.remove_symbol(&symbol),
        Action::ShowChart(symbol) => app.show_chart(&symbol),
        Action::SelectPeriod(token) => app.select_period(token),
        Action::Predict => app.request_prediction(),
        Action::Search(query) => app.search(query),
        Action::CloseChart => app.hide_chart(),
        Action::Refresh => app.refresh_all(),
        Action::None => {}
    }
    false
}
