use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use reflex::{
    clock::Clock,
    game::GameStatus,
    stats::{format_reaction_time, is_valid_reaction_time, performance_context},
    util::std_dev,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const STATS_HEIGHT: u16 = 6;

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let game = self.session.game();
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints(
                [
                    Constraint::Min(3),
                    Constraint::Length(STATS_HEIGHT),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(area);

        let (colour, headline, detail) = match game.status() {
            GameStatus::Idle => (
                Color::Blue,
                "Reaction Time".to_string(),
                "Press SPACE or click to start".to_string(),
            ),
            GameStatus::Waiting => (
                Color::Red,
                "Wait for green...".to_string(),
                "Don't press yet".to_string(),
            ),
            GameStatus::Ready => (
                Color::Green,
                "PRESS NOW!".to_string(),
                String::new(),
            ),
            GameStatus::Clicked => {
                let reaction_time = game.last_reaction_time().unwrap_or_default();
                let detail = if is_valid_reaction_time(reaction_time) {
                    performance_context(reaction_time).message.to_string()
                } else {
                    "That one didn't look genuine, it won't count.".to_string()
                };
                (Color::Cyan, format_reaction_time(reaction_time), detail)
            }
            GameStatus::FalseStart => (
                Color::Yellow,
                "Too soon!".to_string(),
                "Wait for green. Press SPACE to try again".to_string(),
            ),
        };

        let banner_style = Style::default()
            .patch(bold_style)
            .fg(Color::Black)
            .bg(colour);
        let banner_lines = banner_height(chunks[0].height);
        let banner = Paragraph::new(vec![
            Line::from(Span::styled(headline, banner_style)),
            Line::from(""),
            Line::from(Span::styled(detail, bold_style.fg(colour))),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

        let banner_area = Rect {
            y: chunks[0].y + chunks[0].height.saturating_sub(banner_lines) / 2,
            height: banner_lines.min(chunks[0].height),
            ..chunks[0]
        };
        banner.render(banner_area, buf);

        let stats = game.stats();
        let valid_times = game
            .state()
            .reaction_times
            .iter()
            .copied()
            .filter(|t| is_valid_reaction_time(*t))
            .collect::<Vec<f64>>();
        let or_dash = |t: Option<f64>| t.map_or("-".to_string(), format_reaction_time);

        let recent = if stats.recent_times.is_empty() {
            "-".to_string()
        } else {
            stats
                .recent_times
                .iter()
                .map(|t| format_reaction_time(*t))
                .join("  ")
        };

        let stats_lines = vec![
            Line::from(vec![
                Span::styled("attempts ", dim_style),
                Span::styled(stats.total_attempts.to_string(), bold_style),
                Span::styled("   best ", dim_style),
                Span::styled(or_dash(stats.best_time), bold_style),
                Span::styled("   average ", dim_style),
                Span::styled(or_dash(stats.average_time), bold_style),
                Span::styled("   consistency ", dim_style),
                Span::styled(
                    std_dev(&valid_times).map_or("-".to_string(), |sd| format!("±{sd:.0}ms")),
                    bold_style,
                ),
            ]),
            Line::from(vec![
                Span::styled("recent ", dim_style),
                Span::styled(recent, Style::default().fg(Color::Magenta)),
            ]),
            Line::from(Span::styled(
                "Average human reaction time is 200-300ms",
                italic_style,
            )),
        ];

        Paragraph::new(stats_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Session · round {}", game.state().current_attempt)),
            )
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            "(space/click) press  (r)eset round  (s) clear stats  (esc)ape",
            italic_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }
}

fn banner_height(available: u16) -> u16 {
    available.min(3)
}
