use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::Instant;

use crate::assets::Sprite;
use crate::game::layout::{
    answer_button, toast_box, ANSWER_BUTTONS, LOCK_PANEL, QUESTION_PANEL, TOP_BAR_HEIGHT,
};
use crate::game::{Bounds, ClickableObject, Point, Screen, Session};

use super::viewport::Viewport;

const TEXT: Color = Color::Rgb(240, 240, 240);
const DIM_TEXT: Color = Color::Rgb(200, 200, 200);
const PANEL_BG: Color = Color::Rgb(25, 28, 34);
const PANEL_BORDER: Color = Color::Rgb(220, 220, 220);
const INSET_BG: Color = Color::Rgb(15, 16, 20);
const INSET_BORDER: Color = Color::Rgb(90, 90, 90);
const HEART: Color = Color::Rgb(220, 60, 60);
const LOST_HEART: Color = Color::Rgb(120, 120, 120);
const FLASH: Color = Color::Rgb(230, 50, 50);

/// Draws one full frame: room, objects, status bar, toast, the overlay for
/// the current screen and the mistake flash on top.
pub fn draw_ui(
    f: &mut Frame,
    vp: &Viewport,
    session: &Session,
    backdrop: &Sprite,
    pointer: Option<Point>,
    now: Instant,
) {
    blit(f.buffer_mut(), vp, backdrop, Point::new(0, 0));

    if session.debug() {
        outline(f, vp, session.door(), Color::Rgb(255, 255, 0));
    }
    for object in session.objects() {
        let hovered = pointer.is_some_and(|p| object.contains(p));
        draw_object(f, vp, object, session.debug(), hovered);
    }

    draw_top_bar(f, vp, session);

    if let Some(text) = session.toast_at(now) {
        let (w, h) = vp.logical_size();
        let rect = vp.to_cells(toast_box(w, h));
        f.render_widget(Clear, rect);
        let toast = Paragraph::new(text).style(Style::default().fg(TEXT)).block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(PANEL_BORDER))
                .style(Style::default().bg(Color::Black)),
        );
        f.render_widget(toast, rect);
    }

    match session.screen() {
        Screen::Room => {}
        Screen::Question { .. } => {
            if let Some(object) = session.active_object() {
                draw_question(f, vp, object, pointer);
            }
        }
        Screen::Lock { input } => draw_lock(f, vp, session, input),
        Screen::Won => {
            dim(f.buffer_mut(), vp.area());
            let title = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
            centered_line(f, vp, 270, "You escaped!", title);
            centered_line(f, vp, 310, "ESC = quit", Style::default().fg(PANEL_BORDER));
        }
        Screen::Lost => {
            dim(f.buffer_mut(), vp.area());
            let title = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
            let body = Style::default().fg(PANEL_BORDER);
            let mistakes = format!("You made {} mistakes.", session.rules().max_mistakes);
            centered_line(f, vp, 255, "Your heart broke...", title);
            centered_line(f, vp, 295, &mistakes, body);
            centered_line(f, vp, 330, "R = try again | ESC = quit", body);
        }
    }

    if session.flashing_at(now) {
        draw_cross(f.buffer_mut(), vp);
    }
}

fn draw_object(f: &mut Frame, vp: &Viewport, object: &ClickableObject, debug: bool, hovered: bool) {
    if let Some(sprite) = object.sprite() {
        blit(f.buffer_mut(), vp, sprite, Point::new(object.bounds.x, object.bounds.y));
    }
    if debug {
        let color = match (hovered, object.solved) {
            (true, _) => Color::White,
            (false, false) => Color::Rgb(0, 200, 0),
            (false, true) => LOST_HEART,
        };
        outline(f, vp, object.bounds, color);
    }
}

fn draw_top_bar(f: &mut Frame, vp: &Viewport, session: &Session) {
    let (w, _) = vp.logical_size();
    let rect = vp.to_cells(Bounds::new(0, 0, w, TOP_BAR_HEIGHT));
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::Rgb(80, 80, 80)))
        .style(Style::default().bg(Color::Rgb(18, 18, 22)));
    let inner = block.inner(rect);
    f.render_widget(block, rect);

    let code = format!(" Code: {}", session.visible_code().join(" "));
    f.render_widget(Paragraph::new(code).style(Style::default().fg(TEXT)), inner);

    let max = session.rules().max_mistakes;
    let lives = max.saturating_sub(session.mistakes());
    // The rightmost hearts are the ones still alive.
    let hearts: Vec<Span> = (0..max)
        .rev()
        .map(|i| {
            let color = if i < lives { HEART } else { LOST_HEART };
            Span::styled("♥ ", Style::default().fg(color))
        })
        .collect();
    f.render_widget(
        Paragraph::new(Line::from(hearts).alignment(Alignment::Right)),
        inner,
    );
}

fn draw_question(f: &mut Frame, vp: &Viewport, object: &ClickableObject, pointer: Option<Point>) {
    dim(f.buffer_mut(), vp.area());
    let question = &object.question;
    let p = QUESTION_PANEL;
    panel(f, vp, p, &question.name);

    let text = Paragraph::new(question.text.as_str())
        .style(Style::default().fg(Color::Rgb(235, 235, 235)))
        .wrap(Wrap { trim: true });
    f.render_widget(text, vp.to_cells(Bounds::new(p.x + 18, p.y + 40, p.w - 36, 50)));

    let code_rect = vp.to_cells(Bounds::new(p.x + 18, p.y + 94, p.w - 36, 120));
    let code: Vec<Line> = question.code.split('\n').take(8).map(Line::from).collect();
    let code = Paragraph::new(code)
        .style(Style::default().fg(Color::Rgb(210, 245, 210)))
        .block(inset());
    f.render_widget(code, code_rect);

    for i in 0..ANSWER_BUTTONS {
        let bounds = answer_button(i);
        let hovered = pointer.is_some_and(|pt| bounds.contains(pt));
        let label = question.choices.get(i).map(String::as_str).unwrap_or("-");
        let bg = if hovered {
            Color::Rgb(70, 85, 105)
        } else {
            Color::Rgb(55, 65, 80)
        };
        let button = Paragraph::new(format!("{}) {}", i + 1, label))
            .style(Style::default().fg(TEXT))
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Rgb(210, 210, 210)))
                    .style(Style::default().bg(bg)),
            );
        f.render_widget(button, vp.to_cells(bounds));
    }

    footer(f, vp, p, "ESC = back");
}

fn draw_lock(f: &mut Frame, vp: &Viewport, session: &Session, input: &str) {
    dim(f.buffer_mut(), vp.area());
    let p = LOCK_PANEL;
    panel(f, vp, p, "Door lock");

    let prompt = format!(
        "Enter the code ({} characters) and press ENTER.",
        session.expected_code().chars().count()
    );
    f.render_widget(
        Paragraph::new(prompt).style(Style::default().fg(PANEL_BORDER)),
        vp.to_cells(Bounds::new(p.x + 18, p.y + 50, p.w - 36, 24)),
    );

    let entry = Paragraph::new(input)
        .style(Style::default().fg(Color::Rgb(245, 245, 245)).add_modifier(Modifier::BOLD))
        .block(inset());
    f.render_widget(entry, vp.to_cells(Bounds::new(p.x + 18, p.y + 90, p.w - 36, 60)));

    footer(f, vp, p, "ESC = back");
}

fn panel(f: &mut Frame, vp: &Viewport, bounds: Bounds, title: &str) {
    let rect = vp.to_cells(bounds);
    f.render_widget(Clear, rect);
    f.render_widget(
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(PANEL_BORDER))
            .title(Span::styled(
                format!(" {} ", title),
                Style::default().fg(Color::Rgb(245, 245, 245)).add_modifier(Modifier::BOLD),
            ))
            .style(Style::default().bg(PANEL_BG)),
        rect,
    );
}

fn inset<'a>() -> Block<'a> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(INSET_BORDER))
        .style(Style::default().bg(INSET_BG))
}

fn footer(f: &mut Frame, vp: &Viewport, panel: Bounds, text: &str) {
    let rect = vp.to_cells(Bounds::new(panel.x + 18, panel.bottom() - 30, panel.w - 36, 24));
    f.render_widget(Paragraph::new(text).style(Style::default().fg(DIM_TEXT)), rect);
}

fn outline(f: &mut Frame, vp: &Viewport, bounds: Bounds, color: Color) {
    let rect = vp.to_cells(bounds);
    if rect.width < 2 || rect.height < 2 {
        return;
    }
    f.render_widget(
        Block::bordered().border_style(Style::default().fg(color)),
        rect,
    );
}

/// One line of text centred horizontally around logical row `y`.
fn centered_line(f: &mut Frame, vp: &Viewport, y: i32, text: &str, style: Style) {
    let (w, _) = vp.logical_size();
    let mut rect = vp.to_cells(Bounds::new(0, y - 12, w, 24));
    let area = vp.area();
    if rect.y >= area.bottom() {
        return;
    }
    rect.height = 1;
    f.render_widget(
        Paragraph::new(text).style(style).alignment(Alignment::Center),
        rect,
    );
}

/// Half-block rendering: each cell shows two vertically stacked pixels.
fn blit(buf: &mut Buffer, vp: &Viewport, sprite: &Sprite, origin: Point) {
    let bounds = Bounds::new(origin.x, origin.y, sprite.width() as i32, sprite.height() as i32);
    let cells = vp.to_cells(bounds);
    for row in cells.top()..cells.bottom() {
        let (top, bottom) = vp.half_rows(row);
        for col in cells.left()..cells.right() {
            let Some(centre) = vp.to_logical(col, row) else {
                continue;
            };
            let x = centre.x - origin.x;
            let upper = sprite.opaque_at(x, top - origin.y);
            let lower = sprite.opaque_at(x, bottom - origin.y);
            let Some(cell) = buf.cell_mut((col, row)) else {
                continue;
            };
            match (upper, lower) {
                (Some(u), Some(l)) => {
                    cell.set_symbol("▀").set_fg(rgb(u)).set_bg(rgb(l));
                }
                (Some(u), None) => {
                    cell.set_symbol("▀").set_fg(rgb(u));
                }
                (None, Some(l)) => {
                    cell.set_symbol("▄").set_fg(rgb(l));
                }
                (None, None) => {}
            }
        }
    }
}

fn draw_cross(buf: &mut Buffer, vp: &Viewport) {
    const HALF: i32 = 70;
    let (w, h) = vp.logical_size();
    let (cx, cy) = (w / 2, h / 2);
    let square = Bounds::new(cx - HALF, cy - HALF, HALF * 2, HALF * 2);
    let (cell_w, cell_h) = vp.cell_size();
    let thickness = cell_w.max(cell_h) / 2 + 6;

    let cells = vp.to_cells(square);
    for row in cells.top()..cells.bottom() {
        for col in cells.left()..cells.right() {
            let Some(p) = vp.to_logical(col, row) else {
                continue;
            };
            let dx = p.x - square.x;
            let dy = p.y - square.y;
            if (dx - dy).abs() <= thickness || (dx + dy - square.w).abs() <= thickness {
                if let Some(cell) = buf.cell_mut((col, row)) {
                    cell.set_symbol("█").set_fg(FLASH);
                }
            }
        }
    }
}

/// Darkens everything already drawn, like a translucent black layer.
fn dim(buf: &mut Buffer, area: Rect) {
    for row in area.top()..area.bottom() {
        for col in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((col, row)) {
                let fg = shade(cell.fg, Color::DarkGray);
                let bg = shade(cell.bg, Color::Black);
                cell.set_fg(fg).set_bg(bg);
            }
        }
    }
}

fn shade(color: Color, fallback: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let f = |c: u8| (c as u16 * 75 / 255) as u8;
            Color::Rgb(f(r), f(g), f(b))
        }
        _ => fallback,
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}
