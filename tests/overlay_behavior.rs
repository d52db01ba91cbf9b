//! Focus trap, Escape binding and filter anchoring working together on a bare tree

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;
use riskboard::core::{CellValue, Row};
use riskboard::table::{AnchorUpdate, TableFilter};
use riskboard::ui::{
    Element, ElementId, ElementTree, EscapeBinding, EventTarget, FocusTrap, FocusTrapOptions, Rect,
    Role, TreeChrome, UiEvent,
};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

fn key(code: KeyCode) -> UiEvent {
    UiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn button(tree: &mut ElementTree, parent: ElementId, y: f64) -> ElementId {
    tree.append(
        parent,
        Element::new(Role::Button).with_rect(Rect::new(0.0, y, 10.0, 1.0)),
    )
}

#[test]
fn test_modal_traps_tab_and_restores_opener() {
    let mut tree = ElementTree::new(Rect::new(0.0, 0.0, 80.0, 24.0));
    let root = tree.root();
    let opener = button(&mut tree, root, 0.0);
    tree.focus(opener);

    let modal = tree.append(
        root,
        Element::new(Role::Container).with_rect(Rect::new(0.0, 5.0, 40.0, 10.0)),
    );
    let first = button(&mut tree, modal, 6.0);
    let hidden = tree.append(
        modal,
        Element::new(Role::Button).with_rect(Rect::new(0.0, 7.0, 10.0, 1.0)),
    );
    tree.get_mut(hidden).unwrap().display_none = true;
    let last = button(&mut tree, modal, 8.0);

    let closes = Rc::new(Cell::new(0));
    let counter = closes.clone();
    let mut trap = FocusTrap::activate(&mut tree, modal, None, FocusTrapOptions::default());
    let mut escape = EscapeBinding::bind(&mut tree, move || counter.set(counter.get() + 1));

    // nothing moves before the first frame
    assert_eq!(tree.active_element(), Some(opener));
    trap.on_frame(&mut tree);
    assert_eq!(tree.active_element(), Some(first));

    // hidden elements are skipped; Tab on the last wraps
    assert_eq!(tree.focusable_descendants(modal), vec![first, last]);
    tree.focus(last);
    assert!(trap.handle_event(&mut tree, &key(KeyCode::Tab)));
    assert_eq!(tree.active_element(), Some(first));

    // Escape fires wherever focus is, once per press
    assert!(escape.handle_event(&tree, &key(KeyCode::Esc)));
    tree.focus(opener);
    assert!(escape.handle_event(&tree, &key(KeyCode::Esc)));
    assert!(!escape.handle_event(&tree, &key(KeyCode::Enter)));
    assert_eq!(closes.get(), 2);

    let listeners = tree.listener_count();
    escape.unbind(&mut tree);
    trap.deactivate(&mut tree);
    assert_eq!(tree.listener_count(), listeners - 2);
    assert_eq!(tree.active_element(), Some(opener));
    assert!(!escape.handle_event(&tree, &key(KeyCode::Esc)));
}

#[test]
fn test_filter_anchor_follows_rerendered_header() {
    let mut tree = ElementTree::new(Rect::new(0.0, 0.0, 80.0, 24.0));
    let root = tree.root();
    let chrome_el = tree.append(
        root,
        Element::new(Role::Container).with_rect(Rect::new(0.0, 0.0, 80.0, 3.0)),
    );
    let chrome = TreeChrome::new(Some(chrome_el));
    let header = tree.append(root, Element::new(Role::HeaderRow));
    let mount_cell = |tree: &mut ElementTree, x: f64| {
        tree.append(
            header,
            Element::new(Role::HeaderCell)
                .with_column("risk_level")
                .with_rect(Rect::new(x, 4.0, 12.0, 1.0)),
        )
    };
    let cell = mount_cell(&mut tree, 10.0);

    let rows = vec![
        Row::new([("risk_level", CellValue::from("High"))]),
        Row::new([("risk_level", CellValue::from("Low"))]),
    ];
    let mut filter = TableFilter::new(Duration::from_millis(240));
    filter.open_filter(&mut tree, &chrome, "risk_level", cell);
    assert_eq!(filter.on_frame(&mut tree), AnchorUpdate::Measured);
    assert_eq!(filter.distinct_values_for_active_column(&rows), vec!["High", "Low"]);

    // scroll moves the cell; the refresh waits for the frame and settles later
    let t0 = Instant::now();
    tree.set_rect(cell, Rect::new(10.0, 2.0, 12.0, 1.0));
    assert!(filter.handle_event(&tree, &UiEvent::Scroll(EventTarget::Window), t0));
    assert_eq!(filter.anchor_rect().map(|r| r.y), Some(4.0));
    assert_eq!(filter.on_frame(&mut tree), AnchorUpdate::Measured);
    assert_eq!(filter.anchor_rect().map(|r| r.y), Some(2.0));
    filter.on_tick(t0 + Duration::from_millis(240));
    assert!(filter.has_pending_frame());
    assert_eq!(filter.on_frame(&mut tree), AnchorUpdate::Measured);

    // the header is rebuilt: the next scroll moves the anchor to the new cell
    tree.remove(cell);
    let replacement = mount_cell(&mut tree, 30.0);
    let t1 = t0 + Duration::from_millis(500);
    assert!(filter.handle_event(&tree, &UiEvent::Scroll(EventTarget::Window), t1));
    assert_eq!(filter.on_frame(&mut tree), AnchorUpdate::Reanchored(replacement));
    assert_eq!(filter.anchor_rect().map(|r| r.x), Some(30.0));

    // no cell renders the column any more
    tree.remove(replacement);
    filter.invalidate_anchor();
    assert_eq!(filter.on_frame(&mut tree), AnchorUpdate::Closed);
    assert!(!filter.is_open());
}
