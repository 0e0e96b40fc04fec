// services/metrics-dash/src/ui/mod.rs
//
// Frame layout and the chrome around the active view: header with tabs
// and date range, activity log, key help footer.

mod views;
mod widgets;

use ratatui::{prelude::*, widgets::*};

use crate::app::App;
use crate::date_range::format_date_range_for_display;
use crate::state::{LogLevel, View};

// Color palette: Red, White, Silver, Gold
pub mod colors {
    use ratatui::style::Color;

    pub const RED: Color = Color::Rgb(220, 50, 47);
    pub const DARK_RED: Color = Color::Rgb(139, 0, 0);
    pub const WHITE: Color = Color::Rgb(253, 246, 227);
    pub const SILVER: Color = Color::Rgb(147, 161, 161);
    pub const GOLD: Color = Color::Rgb(255, 193, 37);
    pub const DARK_GOLD: Color = Color::Rgb(184, 134, 11);
    pub const BG_DARK: Color = Color::Rgb(0, 20, 30);
    pub const BG_PANEL: Color = Color::Rgb(7, 30, 41);
    pub const SUCCESS: Color = Color::Rgb(133, 153, 0);
    pub const ERROR: Color = Color::Rgb(220, 50, 47);
}

pub fn draw(frame: &mut Frame, app: &App) {
    let background = Block::default().style(Style::default().bg(colors::BG_DARK));
    frame.render_widget(background, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(2),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], app);
    views::draw_view(frame, chunks[1], app);
    draw_activity_panel(frame, chunks[2], app);
    draw_footer(frame, chunks[3], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let (mode_text, mode_color) = if app.is_demo() {
        ("DEMO", colors::GOLD)
    } else {
        ("LIVE", colors::SUCCESS)
    };
    let range = app.controller().range();

    let mut title = vec![
        Span::styled(
            " METRICS-DASH ",
            Style::default().fg(colors::WHITE).bg(colors::DARK_RED).bold(),
        ),
        Span::raw("  "),
        Span::styled(
            format_date_range_for_display(range.start(), range.end()),
            Style::default().fg(colors::GOLD).bold(),
        ),
        Span::styled(
            format!("  ({} days)", range.days()),
            Style::default().fg(colors::SILVER).add_modifier(Modifier::DIM),
        ),
        Span::raw("  "),
        Span::styled(format!("[{}]", mode_text), Style::default().fg(mode_color).bold()),
    ];
    if app.refresh_indicator() {
        title.push(Span::raw("  "));
        title.push(Span::styled("↻ refreshed", Style::default().fg(colors::SUCCESS).bold()));
    }

    let tabs = Tabs::new(View::ALL.iter().map(|view| Line::from(view.title())).collect::<Vec<_>>())
        .select(app.view().index())
        .style(Style::default().fg(colors::SILVER))
        .highlight_style(Style::default().fg(colors::GOLD).bold().add_modifier(Modifier::UNDERLINED))
        .divider(Span::styled("|", Style::default().fg(colors::DARK_GOLD)));

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(colors::DARK_RED))
        .style(Style::default().bg(colors::BG_DARK));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    frame.render_widget(Paragraph::new(Line::from(title)), rows[0]);
    frame.render_widget(tabs, rows[1]);
}

fn draw_activity_panel(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(Span::styled(" ACTIVITY LOG ", Style::default().fg(colors::WHITE).bold()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SILVER))
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(colors::BG_PANEL));

    let visible = area.height.saturating_sub(2) as usize;
    let logs: Vec<Line> = app
        .log()
        .recent()
        .take(visible)
        .map(|entry| {
            let (prefix, color) = match entry.level {
                LogLevel::Error => ("[ERR]", colors::ERROR),
                LogLevel::Warn => ("[WRN]", colors::GOLD),
                LogLevel::Info => ("[INF]", colors::SUCCESS),
            };

            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp.format("%H:%M:%S")),
                    Style::default().fg(colors::SILVER).add_modifier(Modifier::DIM),
                ),
                Span::styled(format!("{} ", prefix), Style::default().fg(color)),
                Span::styled(entry.message.as_str(), Style::default().fg(colors::WHITE)),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(logs).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn key_badge(key: &'static str, label: &'static str, color: Color) -> [Span<'static>; 3] {
    [
        Span::styled(format!(" [{}] ", key), Style::default().fg(colors::BG_DARK).bg(color)),
        Span::styled(format!(" {} ", label), Style::default().fg(colors::SILVER)),
        Span::raw(" "),
    ]
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let mut badges = vec![
        key_badge("Q", "Quit", colors::RED),
        key_badge("TAB", "View", colors::GOLD),
        key_badge("R", "Refresh", colors::WHITE),
        key_badge("[ ]", "Shift week", colors::SILVER),
        key_badge("P", "Preset", colors::SILVER),
    ];
    match app.view() {
        View::PullRequests if app.is_editing_search() => {
            badges = vec![
                key_badge("TAB", "Next field", colors::GOLD),
                key_badge("ENTER", "Done", colors::WHITE),
            ];
        }
        View::PullRequests => {
            badges.push(key_badge("S", "State", colors::GOLD));
            badges.push(key_badge("C", "Sort column", colors::GOLD));
            badges.push(key_badge("O", "Order", colors::GOLD));
            badges.push(key_badge("/", "Search", colors::WHITE));
            badges.push(key_badge("X", "Clear", colors::SILVER));
        }
        View::Qe => {
            badges.push(key_badge("N", "Sort repos", colors::GOLD));
            badges.push(key_badge("O", "Order", colors::GOLD));
        }
        _ => {}
    }

    let help = Line::from(badges.into_iter().flatten().collect::<Vec<_>>());
    let footer = Paragraph::new(help).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(colors::DARK_RED))
            .style(Style::default().bg(colors::BG_DARK)),
    );

    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockMetricsSource;
    use crate::app::testing::demo_app;
    use ratatui::backend::TestBackend;
    use std::time::Duration;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(160, 48);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test(start_paused = true)]
    async fn test_header_shows_range_and_mode() {
        let app = demo_app(View::Dashboard, MockMetricsSource::new(Duration::from_millis(100)));
        let screen = render(&app);
        assert!(screen.contains("METRICS-DASH"));
        assert!(screen.contains("05/20/2025 – 06/19/2025"));
        assert!(screen.contains("[DEMO]"));
        assert!(screen.contains("Pull Requests"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_view_renders_loaded_data() {
        for view in View::ALL {
            let mut app = demo_app(view, MockMetricsSource::new(Duration::from_millis(100)));
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(render(&app).contains("Loading"), "{view:?} shows loading");

            tokio::time::sleep(Duration::from_millis(150)).await;
            app.on_tick();
            let screen = render(&app);
            assert!(!screen.contains("Loading"), "{view:?} finished loading");
            assert!(!screen.contains(&view.domain().empty_message()), "{view:?} has data:\n{screen}");
        }
    }
}
