use crate::state::App;
use crate::theme;
use enact_core::{AgentBlock, InteractionKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const LEGEND: [InteractionKind; 6] = [
    InteractionKind::Bump,
    InteractionKind::Step,
    InteractionKind::TurnLeft,
    InteractionKind::TurnRight,
    InteractionKind::NoFeel,
    InteractionKind::Feel,
];

pub fn render(f: &mut Frame, app: &App) {
    let area = f.size();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_header(f, app, layout[0]);
    render_traces(f, app, layout[1]);

    if app.show_help {
        render_help(f, centered(area, 44, 16));
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let updated = app
        .last_update
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let line = Line::from(vec![
        Span::styled("source ", Style::default().fg(theme::MUTED)),
        Span::raw(app.source.clone()),
        Span::styled("  agents ", Style::default().fg(theme::MUTED)),
        Span::raw(app.panel.len().to_string()),
        Span::styled("  updated ", Style::default().fg(theme::MUTED)),
        Span::raw(updated),
        Span::styled("  updates ", Style::default().fg(theme::MUTED)),
        Span::raw(app.updates.to_string()),
        Span::styled("  every ", Style::default().fg(theme::MUTED)),
        Span::raw(format!("{}ms", app.interval.as_millis())),
        Span::styled("  ? help", Style::default().fg(theme::MUTED)),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled("Enaction Traces", theme::HEADER_STYLE));
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn render_traces(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Traces");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.panel.is_empty() {
        let message = if app.last_update.is_some() {
            "No agents in the latest payload"
        } else {
            "Waiting for traces"
        };
        let text = vec![
            Line::from(Span::styled(message, theme::WARN)),
            Line::from(""),
            Line::from(Span::styled(
                format!("polling {}", app.source),
                Style::default().fg(theme::MUTED),
            )),
        ];
        f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
        return;
    }

    let mut lines = Vec::with_capacity(app.panel.len() * 3);
    for agent in app.panel.blocks() {
        lines.push(Line::from(Span::styled(agent.agent.clone(), theme::AGENT_STYLE)));
        lines.push(strip_line(agent));
        lines.push(Line::from(""));
    }
    f.render_widget(Paragraph::new(lines).scroll((app.scroll, 0)), inner);
}

/// Mirrors `AgentBlock::strip`, styling each glyph by its interaction kind.
fn strip_line(agent: &AgentBlock) -> Line<'static> {
    let mut spans = Vec::with_capacity(agent.trace.len() * 2);
    for kind in &agent.trace {
        spans.push(Span::raw(" "));
        if let Some(glyph) = kind.glyph() {
            spans.push(Span::styled(glyph.to_string(), theme::glyph_style(kind)));
        }
    }
    Line::from(spans)
}

fn render_help(f: &mut Frame, area: Rect) {
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut text = vec![
        Line::from(Span::styled(
            "Keys",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("j/k", Color::Cyan),
            Span::raw("    Scroll"),
        ]),
        Line::from(vec![
            Span::styled("g/G", Color::Cyan),
            Span::raw("    Top / bottom"),
        ]),
        Line::from(vec![Span::styled("?", Color::Cyan), Span::raw("      Toggle help")]),
        Line::from(vec![Span::styled("q", Color::Cyan), Span::raw("      Quit")]),
        Line::from(""),
        Line::from(Span::styled(
            "Legend",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    for kind in LEGEND.iter() {
        let glyph = kind.glyph().map(String::from).unwrap_or_default();
        text.push(Line::from(vec![
            Span::styled(glyph, theme::glyph_style(kind)),
            Span::raw(format!("      {kind}")),
        ]));
    }

    f.render_widget(Paragraph::new(text), inner);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
