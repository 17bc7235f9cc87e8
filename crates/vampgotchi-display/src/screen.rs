//! Screen composition: turns a [`SystemState`] snapshot into a [`Frame`].
//!
//! Layout is split in two steps: [`describe`] produces the text lines the
//! panel shows (pure, easy to assert on) and [`compose`] draws them next to
//! the character face.

use chrono::{DateTime, Utc};
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Arc, Circle, Line, PrimitiveStyle, Triangle};
use embedded_graphics::text::{Baseline, Text};

use vampgotchi_core::{Mood, SystemState, format_uptime};

use crate::frame::Frame;

const TITLE: &str = "VAMPGOTCHI";
const CHAR_WIDTH: u32 = 6;
const LINE_HEIGHT: i32 = 10;
/// Left edge of the text column beside the face.
const COLUMN_X: i32 = 64;
const FACE_ORIGIN: Point = Point::new(8, 14);
const FACE_DIAMETER: u32 = 44;

/// The text content of one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenText {
    pub title: String,
    pub uptime: String,
    pub mood: String,
    pub mode: String,
    pub counters: String,
    pub target: String,
    pub network: String,
    pub error: Option<String>,
    pub activity: Vec<String>,
    pub vitals: String,
}

pub fn describe(state: &SystemState, ip: &str, now: DateTime<Utc>) -> ScreenText {
    let target = state.selected_device().map_or_else(
        || "TGT: none".to_owned(),
        |d| format!("TGT: {} {}dBm", d.label(), d.signal_strength),
    );
    let vitals = &state.vitals;

    ScreenText {
        title: TITLE.to_owned(),
        uptime: format!("UP {}", format_uptime(state.uptime(now))),
        mood: state.mood.to_string(),
        mode: format!("MODE: {}", state.mode),
        counters: format!(
            "SCANS {} ATK {} FOUND {}",
            state.counters.total_scans,
            state.counters.total_attacks,
            state.counters.devices_found_last_scan
        ),
        target,
        network: format!("NET: {} {ip}", state.network_mode.short_label()),
        error: state
            .last_error
            .as_ref()
            .map(|e| format!("ERR: {}", e.message)),
        activity: state.activity.recent(2).map(str::to_owned).collect(),
        vitals: format!(
            "HGR {}% BLD {}% LV{} EXP {}/{} ${}",
            vitals.hunger_percent(),
            vitals.blood,
            vitals.level,
            vitals.exp,
            vitals.exp_to_next,
            vitals.money
        ),
    }
}

/// Draw `state` into a fresh frame of the given size, using the theme
/// carried by the snapshot.
pub fn compose(state: &SystemState, ip: &str, now: DateTime<Utc>, width: u32, height: u32) -> Frame {
    let text = describe(state, ip, now);
    let mut frame = Frame::new(width, height, state.theme);
    let style = text_style();

    // ── Header ──
    draw_text(&mut frame, &text.title, Point::new(0, 0), style, usize::MAX);
    let uptime_x = text_x_right_aligned(width, &text.uptime);
    draw_text(&mut frame, &text.uptime, Point::new(uptime_x, 0), style, usize::MAX);
    let rule = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    let right = i32::try_from(width).unwrap_or(i32::MAX) - 1;
    let _ = Line::new(Point::new(0, 11), Point::new(right, 11))
        .into_styled(rule)
        .draw(&mut frame);

    // ── Character ──
    draw_face(&mut frame, state.mood);
    let mood_y = FACE_ORIGIN.y + i32::try_from(FACE_DIAMETER).unwrap_or(0) + 10;
    draw_text(&mut frame, &text.mood, Point::new(4, mood_y), style, 9);

    // ── Status column ──
    let cols = columns(width, COLUMN_X);
    let mut y = 14;
    for line in [&text.mode, &text.counters, &text.target, &text.network] {
        draw_text(&mut frame, line, Point::new(COLUMN_X, y), style, cols);
        y += LINE_HEIGHT;
    }
    if let Some(error) = &text.error {
        draw_text(&mut frame, error, Point::new(COLUMN_X, y), style, cols);
    }
    y += LINE_HEIGHT + 2;
    for line in &text.activity {
        draw_text(&mut frame, line, Point::new(COLUMN_X, y), style, cols);
        y += LINE_HEIGHT;
    }

    // ── Footer ──
    let bottom = i32::try_from(height).unwrap_or(i32::MAX);
    let footer_y = bottom - LINE_HEIGHT - 1;
    let _ = Line::new(Point::new(0, footer_y - 2), Point::new(right, footer_y - 2))
        .into_styled(rule)
        .draw(&mut frame);
    draw_text(
        &mut frame,
        &text.vitals,
        Point::new(0, footer_y),
        style,
        columns(width, 0),
    );

    frame
}

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

fn draw_text(
    frame: &mut Frame,
    text: &str,
    at: Point,
    style: MonoTextStyle<'static, BinaryColor>,
    max_chars: usize,
) {
    let fitted = fit(text, max_chars);
    let _ = Text::with_baseline(&fitted, at, style, Baseline::Top).draw(frame);
}

/// Clip `text` to `max_chars`, marking the cut with `~`.
fn fit(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('~');
    out
}

#[allow(clippy::as_conversions)]
fn columns(width: u32, x: i32) -> usize {
    let usable = width.saturating_sub(u32::try_from(x).unwrap_or(0));
    (usable / CHAR_WIDTH) as usize
}

fn text_x_right_aligned(width: u32, text: &str) -> i32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    let x = width.saturating_sub(chars.saturating_mul(CHAR_WIDTH));
    i32::try_from(x).unwrap_or(0)
}

// ── Face ────────────────────────────────────────────────────────────

fn draw_face(frame: &mut Frame, mood: Mood) {
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    let thick = PrimitiveStyle::with_stroke(BinaryColor::On, 2);
    let fill = PrimitiveStyle::with_fill(BinaryColor::On);
    let o = FACE_ORIGIN;
    let at = |dx: i32, dy: i32| Point::new(o.x + dx, o.y + dy);

    let _ = Circle::new(o, FACE_DIAMETER).into_styled(stroke).draw(frame);

    // eyes
    match mood {
        Mood::Happy => {
            let _ = Circle::new(at(11, 14), 5).into_styled(fill).draw(frame);
            // wink
            let _ = Line::new(at(27, 16), at(33, 16)).into_styled(thick).draw(frame);
        }
        Mood::Excited => {
            let _ = Circle::new(at(10, 12), 8).into_styled(fill).draw(frame);
            let _ = Circle::new(at(26, 12), 8).into_styled(fill).draw(frame);
        }
        Mood::Sad => {
            let _ = Line::new(at(10, 14), at(16, 17)).into_styled(thick).draw(frame);
            let _ = Line::new(at(28, 17), at(34, 14)).into_styled(thick).draw(frame);
        }
        Mood::Angry => {
            let _ = Line::new(at(9, 11), at(17, 15)).into_styled(thick).draw(frame);
            let _ = Line::new(at(27, 15), at(35, 11)).into_styled(thick).draw(frame);
            let _ = Circle::new(at(12, 16), 4).into_styled(fill).draw(frame);
            let _ = Circle::new(at(28, 16), 4).into_styled(fill).draw(frame);
        }
        Mood::Bored => {
            let _ = Line::new(at(10, 16), at(17, 16)).into_styled(thick).draw(frame);
            let _ = Line::new(at(27, 16), at(34, 16)).into_styled(thick).draw(frame);
        }
    }

    // mouth
    match mood {
        Mood::Happy | Mood::Excited => {
            let _ = Arc::new(at(12, 18), 20, 30.0_f32.deg(), 120.0_f32.deg())
                .into_styled(stroke)
                .draw(frame);
        }
        Mood::Sad => {
            let _ = Arc::new(at(12, 28), 20, 210.0_f32.deg(), 120.0_f32.deg())
                .into_styled(stroke)
                .draw(frame);
        }
        Mood::Angry | Mood::Bored => {
            let _ = Line::new(at(15, 31), at(29, 31)).into_styled(stroke).draw(frame);
        }
    }

    // fangs
    let _ = Triangle::new(at(16, 32), at(19, 32), at(17, 37))
        .into_styled(fill)
        .draw(frame);
    let _ = Triangle::new(at(25, 32), at(28, 32), at(27, 37))
        .into_styled(fill)
        .draw(frame);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;
    use vampgotchi_core::{
        BackendError, BackendErrorKind, DeviceAddress, DeviceRecord, LastError, Mode, NetworkMode,
        Theme,
    };

    fn state() -> SystemState {
        let started = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        SystemState::new(started, NetworkMode::Client, Theme::BLACK)
    }

    fn later(state: &SystemState, minutes: i64) -> DateTime<Utc> {
        state.started_at + TimeDelta::minutes(minutes)
    }

    #[test]
    fn describes_idle_boot_screen() {
        let s = state();
        let text = describe(&s, "10.0.0.7", later(&s, 65));
        assert_eq!(text.uptime, "UP 0d 01h 05m");
        assert_eq!(text.mode, "MODE: IDLE");
        assert_eq!(text.mood, "BORED");
        assert_eq!(text.counters, "SCANS 0 ATK 0 FOUND 0");
        assert_eq!(text.target, "TGT: none");
        assert_eq!(text.network, "NET: CLIENT 10.0.0.7");
        assert_eq!(text.error, None);
        assert!(text.activity.is_empty());
        assert_eq!(text.vitals, "HGR 80% BLD 100% LV5 EXP 150/200 $400");
    }

    #[test]
    fn describes_target_and_error() {
        let mut s = state();
        let address = DeviceAddress::new("aa:bb:cc:dd:ee:ff");
        s.devices
            .push(DeviceRecord::new(address.clone(), Some("Headphones"), -61, s.started_at));
        s.selected_target = Some(address);
        s.mode = Mode::Error;
        s.last_error = Some(LastError::new(
            BackendError::new(BackendErrorKind::Timeout, "scan timed out after 20s"),
            s.started_at,
        ));

        let text = describe(&s, "192.168.4.1", s.started_at);
        assert_eq!(text.target, "TGT: Headphones -61dBm");
        assert_eq!(text.error.as_deref(), Some("ERR: scan timed out after 20s"));
    }

    #[test]
    fn activity_shows_last_two_lines() {
        let mut s = state();
        s.activity.push(vampgotchi_core::ActivityEvent::ScanStarted);
        s.activity.push(vampgotchi_core::ActivityEvent::DevicesFound);
        s.activity.push(vampgotchi_core::ActivityEvent::LevelUp);
        let text = describe(&s, "", s.started_at);
        assert_eq!(text.activity, vec!["> Found devices!", "> Level up!"]);
    }

    #[test]
    fn fit_marks_truncation() {
        assert_eq!(fit("short", 10), "short");
        assert_eq!(fit("exactly10!", 10), "exactly10!");
        assert_eq!(fit("much too long", 5), "much~");
    }

    #[test]
    fn every_mood_draws_a_distinct_face() {
        let mut frames = Vec::new();
        for mood in [Mood::Bored, Mood::Happy, Mood::Excited, Mood::Sad, Mood::Angry] {
            let mut s = state();
            s.mood = mood;
            let frame = compose(&s, "10.0.0.7", s.started_at, 250, 122);
            assert!(frame.foreground_pixels() > 0);
            frames.push(frame);
        }
        for (i, a) in frames.iter().enumerate() {
            for b in frames.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn theme_inverts_the_panel() {
        let mut s = state();
        let black = compose(&s, "10.0.0.7", s.started_at, 250, 122);
        s.theme = Theme::WHITE;
        let white = compose(&s, "10.0.0.7", s.started_at, 250, 122);

        assert_eq!(black.foreground_pixels(), white.foreground_pixels());
        assert_eq!(black.ink_at(249, 121), Some(vampgotchi_core::Ink::White));
        assert_eq!(white.ink_at(249, 121), Some(vampgotchi_core::Ink::Black));
    }

    #[test]
    fn small_panels_do_not_panic() {
        let s = state();
        let frame = compose(&s, "10.0.0.7", s.started_at, 32, 16);
        assert_eq!(frame.width(), 32);
    }
}
