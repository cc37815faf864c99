use enact_core::InteractionKind;
use ratatui::style::{Color, Modifier, Style};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(142, 192, 124))
    .add_modifier(Modifier::BOLD);
pub const AGENT_STYLE: Style = Style::new()
    .fg(Color::Rgb(131, 165, 152))
    .add_modifier(Modifier::BOLD);
pub const MUTED: Color = Color::Rgb(146, 131, 116);
pub const WARN: Color = Color::Rgb(250, 189, 47);

pub fn glyph_color(kind: &InteractionKind) -> Color {
    match kind {
        InteractionKind::Bump => Color::Rgb(254, 128, 25),
        InteractionKind::Step => Color::Rgb(184, 187, 38),
        InteractionKind::TurnLeft | InteractionKind::TurnRight => Color::Rgb(69, 133, 136),
        InteractionKind::Feel => Color::Rgb(211, 134, 155),
        InteractionKind::NoFeel => Color::Rgb(189, 174, 147),
        InteractionKind::Other(_) => MUTED,
    }
}

pub fn glyph_style(kind: &InteractionKind) -> Style {
    Style::new().fg(glyph_color(kind))
}
