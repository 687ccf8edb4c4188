//! State machine flows driven through the editor's input surface.

use pretty_assertions::assert_eq;
use vellum_core::{NodeId, NodeKind, PropKey, SceneGraph, SceneNode, Viewport};
use vellum_editor::session::BufferedTextHost;
use vellum_editor::states::Rotating;
use vellum_editor::surface::{OverlayRecorder, OverlayStyle};
use vellum_editor::{Editor, EditorConfig, KeyEvent, Modifiers, PointerEvent, StateKind, ToolKind};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two 100×100 rectangles at (50,50) and (300,50), plus a text node at (500,50).
fn editor(tag: &str) -> (Editor, [NodeId; 3]) {
    let [r1, r2, t] = ["r1", "r2", "t"].map(|n| NodeId::intern(&format!("{tag}_{n}")));
    let mut graph = SceneGraph::new();
    graph.add_node(
        graph.root,
        SceneNode::new(r1, NodeKind::Rectangle)
            .with(PropKey::X, 50.0)
            .with(PropKey::Y, 50.0),
        None,
    );
    graph.add_node(
        graph.root,
        SceneNode::new(r2, NodeKind::Rectangle)
            .with(PropKey::X, 300.0)
            .with(PropKey::Y, 50.0),
        None,
    );
    graph.add_node(
        graph.root,
        SceneNode::new(t, NodeKind::Text)
            .with(PropKey::X, 500.0)
            .with(PropKey::Y, 50.0)
            .with(PropKey::Text, "Hi"),
        None,
    );
    let config = EditorConfig {
        snapping: false,
        ..EditorConfig::default()
    };
    (Editor::new(graph, Viewport::default(), config), [r1, r2, t])
}

fn click(editor: &mut Editor, x: f32, y: f32) {
    editor.pointer_down(&PointerEvent::new(x, y));
    editor.pointer_up(&PointerEvent::new(x, y));
}

fn number(editor: &Editor, id: NodeId, key: PropKey) -> Option<f32> {
    editor
        .doc
        .graph()
        .get_by_id(id)
        .and_then(|n| n.props.get(key))
        .and_then(|v| v.as_number())
}

fn text(editor: &Editor, id: NodeId) -> Option<String> {
    editor
        .doc
        .graph()
        .get_by_id(id)
        .and_then(|n| n.props.get(PropKey::Text))
        .and_then(|v| v.as_text())
        .map(str::to_string)
}

fn attach_text_host(editor: &mut Editor) -> BufferedTextHost {
    let host = BufferedTextHost::new();
    editor.session.text_host = Box::new(host.clone());
    host
}

// ─── Selection ───────────────────────────────────────────────────────────

#[test]
fn click_selects_and_empty_click_clears() {
    init();
    let (mut editor, [r1, r2, _]) = editor("ix_sel");

    click(&mut editor, 100.0, 100.0);
    assert_eq!(editor.session.selection.ids(), &[r1]);

    editor.pointer_down(&PointerEvent::new(350.0, 100.0).with_modifiers(Modifiers::shift()));
    editor.pointer_up(&PointerEvent::new(350.0, 100.0));
    assert_eq!(editor.session.selection.ids(), &[r1, r2]);

    click(&mut editor, 700.0, 500.0);
    assert!(editor.session.selection.is_empty());
    assert_eq!(editor.state(), StateKind::Idle);
}

#[test]
fn marquee_selects_intersecting_nodes() {
    init();
    let (mut editor, [r1, r2, _]) = editor("ix_mq");

    editor.pointer_down(&PointerEvent::new(10.0, 10.0));
    editor.pointer_move(&PointerEvent::new(200.0, 200.0));
    assert_eq!(editor.state(), StateKind::MarqueeSelecting);
    assert_eq!(editor.session.selection.ids(), &[r1]);

    editor.pointer_move(&PointerEvent::new(450.0, 200.0));
    editor.pointer_up(&PointerEvent::new(450.0, 200.0));
    assert_eq!(editor.state(), StateKind::Idle);
    assert_eq!(editor.session.selection.ids(), &[r1, r2]);
    assert!(!editor.doc.can_undo());
}

#[test]
fn idle_renders_selection_and_handles() {
    init();
    let (mut editor, _) = editor("ix_render");
    click(&mut editor, 100.0, 100.0);

    let mut surface = OverlayRecorder::new();
    editor.render(&mut surface);
    assert_eq!(surface.count(OverlayStyle::Selection), 1);
    assert!(surface.count(OverlayStyle::Handle) >= 8);
}

// ─── Gestures ────────────────────────────────────────────────────────────

#[test]
fn rotate_without_selection_returns_to_idle() {
    init();
    let (mut editor, _) = editor("ix_rot0");
    editor.transition_to(Box::new(Rotating::new((0.0, 0.0))));
    assert_eq!(editor.state(), StateKind::Idle);
}

#[test]
fn rotate_handle_drag_is_one_step() {
    init();
    let (mut editor, [r1, _, _]) = editor("ix_rot");
    click(&mut editor, 100.0, 100.0);

    // Outside the bottom-right corner, in the rotate zone
    editor.pointer_down(&PointerEvent::new(165.0, 165.0));
    assert_eq!(editor.state(), StateKind::Rotating);
    editor.pointer_move(&PointerEvent::new(35.0, 165.0));
    editor.pointer_up(&PointerEvent::new(35.0, 165.0));

    assert_eq!(editor.state(), StateKind::Idle);
    let rotation = number(&editor, r1, PropKey::Rotation).unwrap();
    assert!((rotation - 90.0).abs() < 1e-3, "rotation was {rotation}");
    assert_eq!(number(&editor, r1, PropKey::X), Some(50.0));
    assert_eq!(editor.doc.undo_len(), 1);

    editor.undo();
    assert_eq!(number(&editor, r1, PropKey::Rotation), None);
}

#[test]
fn drawing_creates_one_undoable_node_and_resets_tool() {
    init();
    let (mut editor, _) = editor("ix_draw");
    let root = editor.doc.graph().root_id();

    editor.set_tool(ToolKind::Rectangle);
    editor.pointer_down(&PointerEvent::new(300.0, 400.0));
    assert_eq!(editor.state(), StateKind::Drawing);
    editor.pointer_move(&PointerEvent::new(360.0, 450.0));
    editor.pointer_up(&PointerEvent::new(360.0, 450.0));

    assert_eq!(editor.state(), StateKind::Idle);
    assert_eq!(editor.session.tool(), ToolKind::Select);
    assert_eq!(editor.doc.undo_len(), 1);

    let id = editor.session.selection.primary().unwrap();
    let node = editor.doc.graph().get_by_id(id).unwrap();
    assert_eq!(node.kind, NodeKind::Rectangle);
    assert_eq!(editor.doc.graph().parent_id(id), Some(root));
    assert_eq!(number(&editor, id, PropKey::X), Some(300.0));
    assert_eq!(number(&editor, id, PropKey::Y), Some(400.0));
    assert_eq!(number(&editor, id, PropKey::Width), Some(60.0));
    assert_eq!(number(&editor, id, PropKey::Height), Some(50.0));

    editor.undo();
    assert!(!editor.doc.graph().contains(id));
    assert!(editor.session.selection.is_empty());
}

// ─── Text ────────────────────────────────────────────────────────────────

#[test]
fn text_tool_creates_and_commits_on_exit() {
    init();
    let (mut editor, _) = editor("ix_text");
    let host = attach_text_host(&mut editor);

    editor.set_tool(ToolKind::Text);
    assert_eq!(editor.state(), StateKind::TextTool);
    click(&mut editor, 400.0, 300.0);
    assert_eq!(editor.state(), StateKind::EditingText);
    let id = host.editing().unwrap();
    assert!(!editor.doc.can_undo());

    host.replace("Hello");
    editor.key_down(&KeyEvent::new("Escape"));

    assert_eq!(editor.state(), StateKind::Idle);
    assert_eq!(text(&editor, id), Some("Hello".to_string()));
    assert_eq!(editor.doc.undo_len(), 1);

    // One step removes both the text and the node
    editor.undo();
    assert!(!editor.doc.graph().contains(id));
}

#[test]
fn empty_new_text_is_discarded() {
    init();
    let (mut editor, _) = editor("ix_text_empty");
    let host = attach_text_host(&mut editor);

    editor.set_tool(ToolKind::Text);
    click(&mut editor, 400.0, 300.0);
    let id = host.editing().unwrap();

    editor.key_down(&KeyEvent::new("Escape"));
    assert_eq!(editor.state(), StateKind::Idle);
    assert!(!editor.doc.graph().contains(id));
    assert!(!editor.doc.can_undo());
}

#[test]
fn double_click_edits_existing_text() {
    init();
    let (mut editor, [_, _, t]) = editor("ix_dbl");
    let host = attach_text_host(&mut editor);

    editor.pointer_down(&PointerEvent::new(510.0, 60.0).with_clicks(2));
    assert_eq!(editor.state(), StateKind::EditingText);
    assert_eq!(host.text(), "Hi");
    editor.pointer_up(&PointerEvent::new(510.0, 60.0));

    host.replace("Hi there");
    // Clicking elsewhere ends the edit
    editor.pointer_down(&PointerEvent::new(10.0, 500.0));
    assert_eq!(editor.state(), StateKind::Idle);
    assert_eq!(text(&editor, t), Some("Hi there".to_string()));
    assert_eq!(editor.doc.undo_len(), 1);

    editor.pointer_up(&PointerEvent::new(10.0, 500.0));
    editor.undo();
    assert_eq!(text(&editor, t), Some("Hi".to_string()));
}

// ─── Hand overlay ────────────────────────────────────────────────────────

#[test]
fn hand_tool_pans_without_touching_state() {
    init();
    let (mut editor, [r1, _, _]) = editor("ix_hand");

    editor.set_tool(ToolKind::Hand);
    assert!(editor.overlay_active());
    assert_eq!(editor.state(), StateKind::Idle);

    editor.pointer_down(&PointerEvent::new(100.0, 100.0));
    editor.pointer_move(&PointerEvent::new(150.0, 120.0));
    editor.pointer_up(&PointerEvent::new(150.0, 120.0));

    assert_eq!(editor.session.camera.screen_to_world(150.0, 120.0), (100.0, 100.0));
    assert!(editor.session.selection.is_empty());
    assert_eq!(number(&editor, r1, PropKey::X), Some(50.0));

    let mut surface = OverlayRecorder::new();
    editor.render(&mut surface);
    assert!(surface.items.is_empty());

    editor.set_tool(ToolKind::Select);
    assert!(!editor.overlay_active());
    assert_eq!(editor.state(), StateKind::Idle);
}

#[test]
fn space_pauses_a_move_without_exiting_it() {
    init();
    let (mut editor, [r1, _, _]) = editor("ix_space");

    editor.pointer_down(&PointerEvent::new(100.0, 100.0));
    editor.pointer_move(&PointerEvent::new(110.0, 100.0));
    assert_eq!(editor.state(), StateKind::Moving);
    assert_eq!(number(&editor, r1, PropKey::X), Some(60.0));

    editor.key_down(&KeyEvent::new(" "));
    assert!(editor.overlay_active());
    assert_eq!(editor.state(), StateKind::Moving);
    editor.pointer_move(&PointerEvent::new(300.0, 300.0));
    assert_eq!(number(&editor, r1, PropKey::X), Some(60.0));

    editor.key_up(&KeyEvent::new(" "));
    assert!(!editor.overlay_active());
    assert_eq!(editor.state(), StateKind::Moving);

    editor.pointer_move(&PointerEvent::new(120.0, 100.0));
    editor.pointer_up(&PointerEvent::new(120.0, 100.0));
    assert_eq!(number(&editor, r1, PropKey::X), Some(70.0));
    assert_eq!(editor.doc.undo_len(), 1);
}

#[test]
fn release_under_space_commits_the_paused_move() {
    init();
    let (mut editor, [r1, _, _]) = editor("ix_space_up");

    editor.pointer_down(&PointerEvent::new(100.0, 100.0));
    editor.pointer_move(&PointerEvent::new(110.0, 100.0));
    assert_eq!(editor.state(), StateKind::Moving);

    editor.key_down(&KeyEvent::new(" "));
    editor.pointer_up(&PointerEvent::new(110.0, 100.0));
    assert!(editor.overlay_active());
    assert_eq!(editor.state(), StateKind::Idle);
    assert_eq!(editor.doc.undo_len(), 1);

    // After Space, plain hover no longer drags the node
    editor.key_up(&KeyEvent::new(" "));
    assert!(!editor.overlay_active());
    editor.pointer_move(&PointerEvent::new(600.0, 500.0));
    assert_eq!(editor.state(), StateKind::Idle);
    assert_eq!(number(&editor, r1, PropKey::X), Some(60.0));
    assert_eq!(editor.doc.undo_len(), 1);

    editor.undo();
    assert_eq!(number(&editor, r1, PropKey::X), Some(50.0));
}

#[test]
fn undo_is_ignored_mid_gesture() {
    init();
    let (mut editor, _) = editor("ix_midundo");
    click(&mut editor, 100.0, 100.0);
    editor.pointer_down(&PointerEvent::new(100.0, 100.0));
    editor.pointer_move(&PointerEvent::new(140.0, 100.0));
    assert_eq!(editor.state(), StateKind::Moving);
    assert!(!editor.undo());
    assert_eq!(editor.state(), StateKind::Moving);
}
