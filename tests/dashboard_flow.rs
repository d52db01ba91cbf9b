//! End-to-end flows through the App with a saved report and a test terminal

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;
use ratatui::{backend::TestBackend, Terminal};
use riskboard::config::Config;
use riskboard::core::{CellValue, PredictResponse, Row};
use riskboard::tui::{App, OverlayKind, StatusKind};
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn sample_report() -> PredictResponse {
    let levels = ["High", "Medium", "Low"];
    let data = (0..60)
        .map(|i| {
            Row::new([
                ("student_id", CellValue::from(format!("S{i:02}").as_str())),
                ("risk_proba", CellValue::from(1.0 - i as f64 / 60.0)),
                ("risk_level", CellValue::from(levels[i % 3])),
                ("absence_count", CellValue::from(i as i64 % 4)),
            ])
        })
        .collect();
    PredictResponse {
        rows: 60,
        report_filename: "prediction_report_7.csv".into(),
        report_url: "/api/download/prediction_report_7.csv".into(),
        data,
    }
}

fn saved_report(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("report.json");
    fs::write(&path, serde_json::to_string(&sample_report()).unwrap()).unwrap();
    path
}

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn press(app: &mut App, terminal: &mut Terminal<TestBackend>, code: KeyCode) {
    app.handle_event(key(code)).unwrap();
    draw(app, terminal);
}

fn draw(app: &mut App, terminal: &mut Terminal<TestBackend>) {
    terminal.draw(|f| app.render(f)).unwrap();
    app.on_frame();
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

fn started() -> (TempDir, App, Terminal<TestBackend>) {
    let dir = TempDir::new().unwrap();
    let report = PredictResponse::load_from_file(&saved_report(&dir)).unwrap();
    let mut app = App::new(&Config::default());
    app.load_report(report);
    let mut terminal = Terminal::new(TestBackend::new(110, 32)).unwrap();
    draw(&mut app, &mut terminal);
    (dir, app, terminal)
}

#[test]
fn test_saved_report_renders_default_columns() {
    let (_dir, app, terminal) = started();
    let text = screen_text(&terminal);

    assert!(text.contains("Student ID"));
    assert!(text.contains("High"));
    assert!(text.contains("prediction_report_7.csv"));
    // absence_count is not a default column
    assert_eq!(
        app.table().visible_columns(),
        &["student_id", "risk_proba", "risk_level"]
    );
    assert_eq!(
        app.status().map(|(_, kind)| kind),
        Some(StatusKind::Success)
    );
}

#[test]
fn test_keyboard_filter_hides_value() {
    let (_dir, mut app, mut terminal) = started();
    // select risk_level and open its filter
    press(&mut app, &mut terminal, KeyCode::Char('l'));
    press(&mut app, &mut terminal, KeyCode::Char('l'));
    press(&mut app, &mut terminal, KeyCode::Char('f'));
    assert_eq!(app.overlay_kind(), Some(OverlayKind::Filter));
    assert_eq!(app.table().filter().active_column(), Some("risk_level"));

    // close, asc, desc, then the first value
    for _ in 0..3 {
        press(&mut app, &mut terminal, KeyCode::Tab);
    }
    press(&mut app, &mut terminal, KeyCode::Char(' '));
    assert!(app.table().filter().is_filtered("risk_level"));
    assert_eq!(app.table().visible_rows().len(), 40);
    // toggling keeps the popover open
    assert_eq!(app.overlay_kind(), Some(OverlayKind::Filter));

    press(&mut app, &mut terminal, KeyCode::Esc);
    assert_eq!(app.overlay_kind(), None);
    // filters outlive the popover
    assert_eq!(app.table().visible_rows().len(), 40);
}

#[test]
fn test_scrolling_pins_header_and_collapses_chrome() {
    let (_dir, mut app, mut terminal) = started();
    for _ in 0..3 {
        press(&mut app, &mut terminal, KeyCode::PageDown);
    }
    assert!(app.table().page_scroll() > 0);

    let t0 = Instant::now();
    app.tick(t0).unwrap();
    app.tick(t0 + Duration::from_millis(500)).unwrap();
    assert!(app.chrome().is_compact());

    draw(&mut app, &mut terminal);
    draw(&mut app, &mut terminal);
    let sticky = app.table().sticky().unwrap();
    let fixed = sticky.fixed_header().expect("header pinned");
    assert_eq!(fixed.top, 1.0);
    assert_eq!(fixed.col_widths.len(), 3);
}

#[tokio::test]
async fn test_failed_upload_keeps_modal_and_report() {
    let (_dir, mut app, mut terminal) = started();
    press(&mut app, &mut terminal, KeyCode::Char('u'));
    assert_eq!(app.overlay_kind(), Some(OverlayKind::Upload));

    for c in "missing.csv".chars() {
        press(&mut app, &mut terminal, KeyCode::Char(c));
    }
    press(&mut app, &mut terminal, KeyCode::Enter);

    for _ in 0..200 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        app.process_messages();
        if app.status().is_some_and(|(_, kind)| kind == StatusKind::Error) {
            break;
        }
    }
    assert_eq!(app.status().map(|(_, kind)| kind), Some(StatusKind::Error));
    assert_eq!(app.overlay_kind(), Some(OverlayKind::Upload));
    assert_eq!(
        app.table().report().map(|r| r.report_filename.as_str()),
        Some("prediction_report_7.csv")
    );

    // no longer submitting, so Escape closes it again
    press(&mut app, &mut terminal, KeyCode::Esc);
    assert_eq!(app.overlay_kind(), None);
}
