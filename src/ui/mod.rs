use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use time::macros::format_description;
use time::Date;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, FocusPane};
use crate::catalog::preset_options;
use crate::config::PickerConfig;
use crate::picker::{CalendarView, DateRangePicker};

const DROPDOWN_WIDTH: u16 = 64;
const DROPDOWN_HEIGHT: u16 = 17;
const PRESET_COLUMN_WIDTH: u16 = 26;

pub fn draw_app(
    frame: &mut Frame,
    picker: &DateRangePicker<CalendarView>,
    state: &AppState,
    style: &PickerConfig,
    list_state: &mut ListState,
) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    render_trigger(frame, picker, vertical[0]);
    render_readout(frame, state, vertical[1]);
    frame.render_widget(
        Paragraph::new(build_status_line(picker, state)).style(Style::default().fg(Color::Gray)),
        vertical[2],
    );

    if let Some(calendar) = picker.widget().filter(|calendar| calendar.is_open()) {
        let area = dropdown_rect(vertical[0], frame.size());
        render_dropdown(frame, picker, calendar, state, style, list_state, area);
    }
}

fn render_trigger(frame: &mut Frame, picker: &DateRangePicker<CalendarView>, area: Rect) {
    let labels = picker.labels();
    let line = Line::from(vec![
        Span::styled(
            labels.applied.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(": "),
        Span::styled(
            labels.applied_dates.clone(),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(" ▾", Style::default().fg(Color::Gray)),
    ]);
    let trigger = Paragraph::new(line).block(
        Block::default()
            .title("Date range")
            .borders(Borders::ALL),
    );
    frame.render_widget(trigger, area);
}

fn render_readout(frame: &mut Frame, state: &AppState, area: Rect) {
    let value_style = Style::default().add_modifier(Modifier::BOLD);
    let lines = match &state.last_change {
        Some(change) => vec![
            Line::from(vec![
                Span::raw("Selected range: "),
                Span::styled(change.selected_key.as_str(), value_style),
            ]),
            Line::from(vec![
                Span::raw("Start date:     "),
                Span::styled(format_day(change.start_date.date()), value_style),
            ]),
            Line::from(vec![
                Span::raw("End date:       "),
                Span::styled(format_day(change.end_date.date()), value_style),
            ]),
        ],
        None => vec![Line::from(Span::styled(
            "No range applied yet. Press `o` to open the picker.",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    let readout = Paragraph::new(lines).block(
        Block::default()
            .title("Last change")
            .borders(Borders::ALL),
    );
    frame.render_widget(readout, area);
}

fn build_status_line(picker: &DateRangePicker<CalendarView>, state: &AppState) -> Text<'static> {
    let open = picker.widget().is_some_and(CalendarView::is_open);
    let mut spans = vec![
        Span::raw("Pending: "),
        Span::styled(
            picker.labels().pending.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(message) = &state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Cyan),
        ));
    }

    let keys = if open {
        "Tab focus • j/k presets • arrows days • </> month • Enter select • a apply • Esc cancel"
    } else {
        "o open • q quit"
    };
    Text::from(vec![
        Line::from(spans),
        Line::from(Span::styled(keys, Style::default().fg(Color::DarkGray))),
    ])
}

fn render_dropdown(
    frame: &mut Frame,
    picker: &DateRangePicker<CalendarView>,
    calendar: &CalendarView,
    state: &AppState,
    style: &PickerConfig,
    list_state: &mut ListState,
    area: Rect,
) {
    frame.render_widget(Clear, area);
    let container = Block::default()
        .borders(Borders::ALL)
        .border_type(container_border(&style.container_style))
        .border_style(Style::default().fg(Color::Cyan));
    let inner = container.inner(area);
    frame.render_widget(container, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(PRESET_COLUMN_WIDTH), Constraint::Min(24)])
        .split(inner);

    render_presets(frame, picker, state, list_state, columns[0]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(columns[1]);

    render_month(frame, picker, calendar, state, rows[0]);
    render_inputs(frame, state, rows[1]);
    render_buttons(frame, style, rows[2]);
}

fn render_presets(
    frame: &mut Frame,
    picker: &DateRangePicker<CalendarView>,
    state: &AppState,
    list_state: &mut ListState,
    area: Rect,
) {
    let items: Vec<ListItem> = preset_options()
        .map(|(key, label)| {
            let style = if picker.is_active_range(key) {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(label, style)))
        })
        .collect();

    let highlight = if state.focus == FocusPane::Presets {
        Style::default().bg(Color::Blue).fg(Color::Black)
    } else {
        Style::default().add_modifier(Modifier::UNDERLINED)
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::RIGHT)
                .border_style(focus_border(state.focus == FocusPane::Presets)),
        )
        .highlight_style(highlight)
        .highlight_symbol("▸ ");
    list_state.select(Some(state.preset_cursor));
    frame.render_stateful_widget(list, area, list_state);
}

fn render_month(
    frame: &mut Frame,
    picker: &DateRangePicker<CalendarView>,
    calendar: &CalendarView,
    state: &AppState,
    area: Rect,
) {
    let calendar_focused = state.focus == FocusPane::Calendar;
    let today = picker.now().date();
    let title = calendar
        .displayed_month()
        .format(format_description!("[month repr:long] [year]"))
        .unwrap_or_else(|_| calendar.displayed_month().to_string());

    let mut lines = Vec::with_capacity(8);
    lines.push(Line::from(vec![
        Span::styled("‹ ", Style::default().fg(Color::Gray)),
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(" ›", Style::default().fg(Color::Gray)),
    ]));
    lines.push(Line::from(
        calendar
            .weekday_headers()
            .iter()
            .map(|header| Span::styled(format!(" {header}"), Style::default().fg(Color::Gray)))
            .collect::<Vec<_>>(),
    ));

    let selection = picker.state();
    for week in calendar.weeks() {
        let mut spans = Vec::with_capacity(7);
        for day in week {
            let Some(day) = day else {
                spans.push(Span::raw("   "));
                continue;
            };
            let mut cell = Style::default();
            if picker.is_day_selected(day) {
                cell = cell.bg(Color::Blue).fg(Color::White);
                if picker.is_day_in_preview_band(day) {
                    cell = cell.bg(Color::DarkGray);
                }
            }
            if selection.custom_start() == Some(day) || selection.custom_end() == Some(day) {
                cell = cell.add_modifier(Modifier::BOLD);
            }
            if day == today {
                cell = cell.add_modifier(Modifier::UNDERLINED);
            }
            if calendar_focused && day == state.day_cursor {
                cell = cell.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!("{:>2}", day.day()), cell));
        }
        lines.push(Line::from(spans));
    }

    let month = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(focus_border(calendar_focused)),
    );
    frame.render_widget(month, area);
}

fn render_inputs(frame: &mut Frame, state: &AppState, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (index, (title, text, pane)) in [
        ("From", &state.start_input, FocusPane::StartInput),
        ("To", &state.end_input, FocusPane::EndInput),
    ]
    .into_iter()
    .enumerate()
    {
        let focused = state.focus == pane;
        let input = Paragraph::new(text.as_str()).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(focus_border(focused)),
        );
        frame.render_widget(input, halves[index]);
        if focused {
            let x = halves[index].x + 1 + UnicodeWidthStr::width(text.as_str()) as u16;
            frame.set_cursor(x.min(halves[index].right().saturating_sub(2)), halves[index].y + 1);
        }
    }
}

fn render_buttons(frame: &mut Frame, style: &PickerConfig, area: Rect) {
    let apply_style = Style::default()
        .bg(button_color(&style.apply_button_style))
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let buttons = Paragraph::new(Line::from(vec![
        Span::styled(" Cancel (Esc) ", Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(" Apply (a) ", apply_style),
    ]))
    .alignment(ratatui::layout::Alignment::Right);
    frame.render_widget(buttons, area);
}

fn focus_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Maps the configured apply-button style name to a colour. Accepts the
/// bootstrap-style `btn-` prefix.
pub fn button_color(name: &str) -> Color {
    match name.trim().trim_start_matches("btn-") {
        "secondary" => Color::Gray,
        "success" => Color::Green,
        "danger" => Color::Red,
        "warning" => Color::Yellow,
        "info" => Color::Cyan,
        _ => Color::Blue,
    }
}

pub fn container_border(name: &str) -> BorderType {
    match name.trim() {
        "rounded" => BorderType::Rounded,
        "double" => BorderType::Double,
        "thick" => BorderType::Thick,
        _ => BorderType::Plain,
    }
}

fn format_day(day: Date) -> String {
    day.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| day.to_string())
}

/// Anchors the dropdown just under the trigger, clamped to the screen.
fn dropdown_rect(trigger: Rect, screen: Rect) -> Rect {
    let width = DROPDOWN_WIDTH.min(screen.width);
    let height = DROPDOWN_HEIGHT.min(screen.height.saturating_sub(trigger.bottom()));
    Rect {
        x: trigger.x,
        y: trigger.bottom(),
        width,
        height,
    }
}
