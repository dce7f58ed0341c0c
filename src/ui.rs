use crate::{
    api::Quote,
    app::{App, CardState, InputMode, Level, Notification, SearchState},
    chart::{ChartHandle, HISTORICAL_LABEL, PREDICTION_LABEL},
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table, Wrap},
    Frame,
};

/// Width of the remove control column, e.g. "[x]".
const REMOVE_WIDTH: u16 = 3;
const CARDS_WIDTH: u16 = 62;

/// Tracks clickable UI regions for mouse interaction, rebuilt every frame
#[derive(Default, Clone, Debug)]
pub struct ClickableRegions {
    /// Card rows: (rect, symbol)
    pub cards: Vec<(Rect, String)>,
    /// Remove controls inside card rows: (rect, symbol)
    pub remove_buttons: Vec<(Rect, String)>,
    /// Period controls: (rect, index into the selector)
    pub period_tabs: Vec<(Rect, usize)>,
    pub predict_button: Option<Rect>,
}

pub fn price_color(quote: &Quote) -> Color {
    if quote.is_positive() {
        Color::Green
    } else {
        Color::Red
    }
}

/// Signed change and signed change percent, two decimals each.
pub fn format_change(quote: &Quote) -> (String, String) {
    (
        format!("{:+.2}", quote.change),
        format!("{:+.2}%", quote.change_percent),
    )
}

pub fn ui(f: &mut Frame, app: &mut App) {
    app.clickable_regions = ClickableRegions::default();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input
            Constraint::Min(10),   // Cards + chart
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_input(f, app, chunks[0]);

    if app.chart_symbol.is_some() {
        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(CARDS_WIDTH), Constraint::Min(30)])
            .split(chunks[1]);
        render_cards(f, app, main[0]);
        render_chart_panel(f, app, main[1]);
    } else {
        render_cards(f, app, chunks[1]);
    }

    render_footer(f, app, chunks[2]);

    if let InputMode::Search(state) = &app.input_mode {
        render_search_dialog(f, state);
    }
    if let Some(note) = &app.notification {
        render_notification(f, note);
    }
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let line = match &app.input_mode {
        InputMode::AddSymbol(text) => Line::from(vec![
            Span::raw(" Symbol: "),
            Span::styled(format!("{text}█"), Style::default().fg(Color::Yellow)),
        ]),
        _ => Line::from(" Press a to add a symbol, / to search").dark_gray(),
    };
    let border = if matches!(app.input_mode, InputMode::AddSymbol(_)) {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Add Stock ")
            .border_style(border),
    );
    f.render_widget(paragraph, area);
}

fn render_cards(f: &mut Frame, app: &mut App, area: Rect) {
    if app.watchlist.is_empty() {
        let empty = Paragraph::new("\n  Your watchlist is empty. Press a to add a symbol.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Watchlist "));
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec!["", "Symbol", "Name", "Price", "Change", "Change %"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .height(1);

    let rows: Vec<Row> = app
        .watchlist
        .symbols()
        .iter()
        .map(|symbol| card_to_row(symbol, app.cards.get(symbol), app.chart_symbol.as_deref() == Some(symbol)))
        .collect();

    let widths = [
        Constraint::Length(REMOVE_WIDTH),
        Constraint::Length(8),  // Symbol
        Constraint::Min(12),    // Name
        Constraint::Length(14), // Price + currency
        Constraint::Length(9),  // Change
        Constraint::Length(9),  // Change %
    ];

    let title = format!(" Watchlist ({}) ", app.watchlist.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::DarkGray));

    f.render_stateful_widget(table, area, &mut app.table_state);

    // Rendering scrolls the table so the selection stays visible; screen row
    // `r` shows symbol `offset + r`.
    let offset = app.table_state.offset();
    let row_x = area.x + 1;
    let row_width = area.width.saturating_sub(2);
    let first_row_y = area.y + 2;
    let visible_rows = area.height.saturating_sub(3);
    for (r, symbol) in app.watchlist.symbols().iter().skip(offset).take(visible_rows as usize).enumerate() {
        let row_y = first_row_y + r as u16;
        app.clickable_regions
            .remove_buttons
            .push((Rect::new(row_x, row_y, REMOVE_WIDTH, 1), symbol.clone()));
        app.clickable_regions
            .cards
            .push((Rect::new(row_x, row_y, row_width, 1), symbol.clone()));
    }
}

/// Last price with its currency code.
pub fn format_price(quote: &Quote) -> String {
    format!("{:.2} {}", quote.price, quote.currency())
}

fn card_to_row(symbol: &str, state: Option<&CardState>, charted: bool) -> Row<'static> {
    let remove = Cell::from("[x]").style(Style::default().fg(Color::DarkGray));
    let symbol_style = if charted {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let symbol_cell = Cell::from(symbol.to_string()).style(symbol_style);

    match state {
        Some(CardState::Ready(quote)) => {
            let color = price_color(quote);
            let (change, change_pct) = format_change(quote);
            Row::new(vec![
                remove,
                symbol_cell,
                Cell::from(quote.name.clone()),
                Cell::from(Line::from(format_price(quote)).alignment(Alignment::Right)),
                Cell::from(Line::from(change).alignment(Alignment::Right)).style(Style::default().fg(color)),
                Cell::from(Line::from(change_pct).alignment(Alignment::Right)).style(Style::default().fg(color)),
            ])
        }
        Some(CardState::Failed { message, .. }) => Row::new(vec![
            remove,
            symbol_cell,
            Cell::from(format!("Error: {message}")).style(Style::default().fg(Color::Red)),
        ]),
        Some(CardState::Loading) | None => Row::new(vec![
            remove,
            symbol_cell,
            Cell::from("Loading...").style(Style::default().fg(Color::DarkGray)),
        ]),
    }
}

fn render_chart_panel(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(8)])
        .split(area);

    // Period controls and the predict button share one bordered line.
    let controls_y = chunks[0].y + 1;
    let mut x = chunks[0].x + 2;
    let mut spans = vec![Span::raw(" ")];
    for (i, control) in app.periods.controls().iter().enumerate() {
        let text = format!(" {} ", control.label);
        let width = text.len() as u16;
        app.clickable_regions.period_tabs.push((Rect::new(x, controls_y, width, 1), i));
        let style = if control.active {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(text, style));
        spans.push(Span::raw(" "));
        x += width + 1;
    }

    let (predict_text, predict_style) = if app.predicting {
        (" Predicting... ", Style::default().fg(Color::DarkGray))
    } else {
        (" Predict 7d ", Style::default().fg(Color::Black).bg(Color::Yellow))
    };
    spans.push(Span::raw("  "));
    x += 2;
    app.clickable_regions.predict_button = Some(Rect::new(x, controls_y, predict_text.len() as u16, 1));
    spans.push(Span::styled(predict_text, predict_style));

    let symbol = app.chart_symbol.clone().unwrap_or_default();
    let controls = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {symbol} "))
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(controls, chunks[0]);

    match app.renderer.handle() {
        Some(handle) => render_chart(f, handle, chunks[1]),
        None => {
            let loading = Paragraph::new("  Loading chart...")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title(" Price History "));
            f.render_widget(loading, chunks[1]);
        }
    }
}

fn stroke_color(label: Option<&str>, dashed: bool) -> Color {
    match label {
        _ if dashed => Color::Yellow,
        Some(HISTORICAL_LABEL) => Color::Cyan,
        Some(PREDICTION_LABEL) => Color::Yellow,
        _ => Color::Cyan,
    }
}

fn render_chart(f: &mut Frame, handle: &ChartHandle, area: Rect) {
    let datasets: Vec<Dataset> = handle
        .strokes()
        .iter()
        .map(|stroke| {
            let dataset = Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(stroke_color(stroke.label, stroke.dashed)))
                .data(&stroke.points);
            match stroke.label {
                Some(label) => dataset.name(label),
                None => dataset,
            }
        })
        .collect();

    let labels = handle.labels();
    let x_labels: Vec<Span> = match labels.len() {
        0 => Vec::new(),
        1 => vec![Span::raw(labels[0].clone())],
        n => vec![
            Span::raw(labels[0].clone()),
            Span::raw(labels[n / 2].clone()),
            Span::raw(labels[n - 1].clone()),
        ],
    };

    let [min_y, max_y] = handle.y_bounds();
    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", handle.title())))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds(handle.x_bounds())
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Price")
                .style(Style::default().fg(Color::Gray))
                .bounds([min_y, max_y])
                .labels(vec![
                    Span::raw(format!("{min_y:.2}")),
                    Span::raw(format!("{:.2}", (min_y + max_y) / 2.0)),
                    Span::raw(format!("{max_y:.2}")),
                ]),
        );

    f.render_widget(chart, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let updated = app
        .last_update
        .map(|t| format!("Updated {}", t.format("%H:%M:%S")))
        .unwrap_or_default();
    let keys = " a=Add | /=Search | ↑↓jk=Nav | Enter=Chart | d=Remove | 1-6=Period | p=Predict | Esc=Close | r=Refresh | q=Quit ";
    let line = Line::from(vec![
        Span::styled(keys, Style::default().fg(Color::Yellow)),
        Span::styled(updated, Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_search_dialog(f: &mut Frame, state: &SearchState) {
    let area = centered_rect(50, 50, f.area());
    f.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Search: "),
            Span::styled(format!("{}█", state.query), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(""),
    ];

    if state.pending {
        lines.push(Line::from("  Searching...").dark_gray());
    } else if state.searched.is_some() && state.results.is_empty() {
        lines.push(Line::from("  No matches").dark_gray());
    }

    for (i, result) in state.results.iter().enumerate() {
        let exchange = result.exchange.as_deref().unwrap_or("?");
        let text = format!("  {:<8} {} ({exchange})", result.symbol, result.name);
        let style = if i == state.selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(text).style(style));
    }

    lines.push(Line::from(""));
    lines.push(Line::from("  Enter=Search/Add, ↑↓=Select, Esc=Cancel").style(Style::default().fg(Color::DarkGray)));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search Symbols ")
            .border_style(Style::default().fg(Color::Magenta)),
    );
    f.render_widget(paragraph, area);
}

fn render_notification(f: &mut Frame, note: &Notification) {
    let area = centered_rect(50, 35, f.area());
    f.render_widget(Clear, area);

    let color = match note.level {
        Level::Info => Color::Cyan,
        Level::Warning => Color::Yellow,
        Level::Error => Color::Red,
    };

    let mut lines = vec![Line::from("")];
    lines.extend(note.body.lines().map(|l| Line::from(format!("  {l}"))));
    lines.push(Line::from(""));
    lines.push(Line::from("  Press any key to close").style(Style::default().fg(Color::DarkGray)));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", note.title))
            .border_style(Style::default().fg(color)),
    );
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
