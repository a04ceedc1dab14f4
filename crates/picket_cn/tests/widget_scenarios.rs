//! End-to-end widget scenarios: a host document, consumer state, widgets
//! and options mounted the way a host UI layer would mount them.

use std::sync::{Arc, Mutex};

use picket_cn::prelude::*;
use picket_core::Rect;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn press<F>(mut handle: F, key: Key) -> EventOutcome
where
    F: FnMut(&KeyboardEvent) -> EventOutcome,
{
    handle(&KeyboardEvent::pressed(key))
}

#[test]
fn select_arrow_navigation_clamps() {
    init_tracing();
    let ctx = StateContext::new();
    let doc = Document::new();
    let value = ctx.use_state(Some(2u32));

    let mut select = cn::select(&doc, &value).build();
    let _options: Vec<_> = [1u32, 2, 3]
        .into_iter()
        .map(|v| select.option(v, format!("Option {}", v)).unwrap())
        .collect();

    press(|e| select.on_key_down(e), Key::ArrowDown);
    assert_eq!(value.get(), Some(3));

    press(|e| select.on_key_down(e), Key::ArrowDown);
    assert_eq!(value.get(), Some(3));

    press(|e| select.on_key_down(e), Key::ArrowUp);
    press(|e| select.on_key_down(e), Key::ArrowUp);
    assert_eq!(value.get(), Some(1));
    assert_eq!(select.view().text, "Option 1");
}

#[test]
fn options_order_by_document_not_mount_order() {
    init_tracing();
    let ctx = StateContext::new();
    let doc = Document::new();
    let value = ctx.use_state(None::<char>);
    let select = cn::select(&doc, &value).build();

    // Host creates nodes A, B, C in the panel, but they mount C, A, B
    let nodes: Vec<_> = (0..3)
        .map(|_| {
            let li = doc.create_element("li");
            doc.append_child(select.panel(), li).unwrap();
            li
        })
        .collect();
    let _c = select.mount_option('c', "C", nodes[2]);
    let _a = select.mount_option('a', "A", nodes[0]);
    let _b = select.mount_option('b', "B", nodes[1]);

    assert_eq!(select.registry().values(), vec!['a', 'b', 'c']);
}

#[test]
fn filtered_list_shrinks_and_remounts() {
    init_tracing();
    let ctx = StateContext::new();
    let doc = Document::new();
    let value = ctx.use_state(None::<&'static str>);
    let select = cn::select(&doc, &value).build();

    let mut shown: Vec<_> = ["ash", "birch", "cedar"]
        .into_iter()
        .map(|v| select.option(v, v).unwrap())
        .collect();
    shown.retain(|o| *o.value() != "birch");
    assert_eq!(select.registry().values(), vec!["ash", "cedar"]);

    // Same value comes back on a new node before the old list is torn down
    let fresh = select.option("ash", "Ash").unwrap();
    shown.remove(0);
    assert_eq!(select.registry().len(), 2);
    assert_eq!(select.registry().get(&"ash").unwrap().node, fresh.node());
    assert_eq!(select.registry().values(), vec!["cedar", "ash"]);
}

#[test]
fn autocomplete_round_trip() {
    init_tracing();
    let ctx = StateContext::new();
    let doc = Document::new();
    let value = ctx.use_state(Some("Lisbon"));

    let mut input = cn::autocomplete(&doc, &value).build();
    let _options: Vec<_> = ["Lisbon", "Porto"]
        .into_iter()
        .map(|city| input.option(city, city).unwrap())
        .collect();
    assert_eq!(input.view().text, "Lisbon");

    input.on_input("");
    assert_eq!(value.get(), None);

    let mut typed = String::new();
    for ch in "Lisbon".chars() {
        typed.push(ch);
        input.on_input(typed.clone());
        if typed != "Lisbon" {
            assert_eq!(value.get(), None, "committed early at {:?}", typed);
        }
    }
    assert_eq!(value.get(), Some("Lisbon"));
}

#[test]
fn multiple_choice_toggle_idempotent() {
    init_tracing();
    let ctx = StateContext::new();
    let doc = Document::new();
    let value = ctx.use_state(vec![3u8, 1, 2]);
    let changes = Arc::new(Mutex::new(0));

    let counter = changes.clone();
    let widget = cn::multiple_select(&doc, &value)
        .on_change(move |_| *counter.lock().unwrap() += 1)
        .build();
    let one = widget.option(1, "One").unwrap();
    let four = widget.option(4, "Four").unwrap();

    one.click();
    one.click();
    four.click();
    four.click();

    assert_eq!(value.get(), vec![3, 2, 1]);
    assert_eq!(*changes.lock().unwrap(), 4);
}

#[test]
fn open_panel_tracks_ancestor_scroll() {
    init_tracing();
    let ctx = StateContext::new();
    let doc = Document::new();
    let value = ctx.use_state(None::<u32>);

    let scroller = doc.create_element("div");
    doc.append_child(doc.body(), scroller).unwrap();

    let mut select = cn::select(&doc, &value).build();
    doc.append_child(scroller, select.root()).unwrap();
    doc.set_bounds(select.root(), Rect::new(0.0, 100.0, 160.0, 30.0))
        .unwrap();

    select.on_click();
    let before = select.view().panel.unwrap();
    assert_eq!(before.style.get("top"), Some("130px"));
    assert_eq!(before.style.get("position"), Some("fixed"));

    doc.scroll_by(scroller, 0.0, 60.0).unwrap();
    let after = select.view().panel.unwrap();
    assert_eq!(after.style.get("top"), Some("70px"));
    assert!(select.is_open());
    assert_eq!(before.container, after.container);
}

#[test]
fn panel_renders_into_custom_target() {
    init_tracing();
    let ctx = StateContext::new();
    let doc = Document::new();
    let value = ctx.use_state(None::<u32>);
    let layer = doc.create_element("div");
    doc.append_child(doc.body(), layer).unwrap();

    let mut select = cn::select(&doc, &value)
        .render_target(layer)
        .panel_style(InlineStyle::new().with("z-index", "50"))
        .anchor(anchors::below_left_offset(4.0))
        .build();
    doc.append_child(doc.body(), select.root()).unwrap();
    doc.set_bounds(select.root(), Rect::new(0.0, 0.0, 100.0, 20.0))
        .unwrap();

    select.open();
    let frame = select.view().panel.unwrap();
    assert_eq!(doc.parent(frame.container), Some(layer));
    assert_eq!(frame.style.get("top"), Some("24px"));
    assert_eq!(frame.style.get("z-index"), Some("50"));

    select.close();
    assert!(doc.children(layer).is_empty());
}

#[test]
fn dropping_widget_tears_everything_down() {
    init_tracing();
    let ctx = StateContext::new();
    let doc = Document::new();
    let value = ctx.use_state(None::<u32>);

    {
        let mut select = cn::select(&doc, &value).build();
        doc.append_child(doc.body(), select.root()).unwrap();
        let _one = select.option(1, "One").unwrap();
        select.open();
        assert_eq!(doc.scroll_listener_count(), 1);
    }

    assert!(doc.children(doc.body()).is_empty());
    assert_eq!(doc.scroll_listener_count(), 0);
}

#[test]
fn registry_changes_request_rebuild() {
    init_tracing();
    let ctx = StateContext::new();
    let doc = Document::new();
    let value = ctx.use_state(None::<u32>);
    let select = cn::select(&doc, &value).build();
    ctx.take_rebuild();

    let one = select.option(1, "One").unwrap();
    assert!(ctx.take_rebuild());

    drop(one);
    assert!(ctx.take_rebuild());
}
