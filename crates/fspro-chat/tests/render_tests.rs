mod common;

use std::rc::Rc;

use common::{create_test_controller, create_test_store, MockGateway, RecordingView, TestController};
use fspro_chat::{FormatOptions, MemoryStore, RenderPipeline, UiEvent};
use fspro_types::{Message, SessionId, PLACEHOLDER_TITLE};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use pretty_assertions::assert_eq;

fn fixed_clock() -> String {
    "12:34".to_string()
}

fn attach_view(controller: &TestController) -> RecordingView {
    let view = RecordingView::default();
    RenderPipeline::new(view.clone(), FormatOptions::default())
        .with_clock(fixed_clock)
        .attach(&mut *controller.store().borrow_mut());
    view
}

fn setup() -> (Rc<MockGateway>, TestController, LocalPool, RecordingView) {
    let gateway = MockGateway::new();
    let (controller, pool) = create_test_controller(gateway.clone());
    let view = attach_view(&controller);
    (gateway, controller, pool, view)
}

#[test]
fn test_empty_state_shows_welcome() {
    let (_gateway, _controller, _pool, view) = setup();
    let screen = view.screen.borrow();

    assert!(screen.welcome_visible);
    assert!(screen.input_enabled);
    assert!(screen.messages.is_empty());
    assert!(screen.sidebar.is_empty());
    assert_eq!(screen.scrolls, 0);
}

#[test]
fn test_typing_indicator_while_waiting() {
    let (gateway, controller, mut pool, view) = setup();
    gateway.reply_with("abc", "<p>Hi</p>");
    let release = gateway.hold_next_send();

    let sender = controller.clone();
    pool.spawner()
        .spawn_local(async move {
            sender.dispatch(UiEvent::Submit("Hello".into())).await.unwrap();
        })
        .unwrap();
    pool.run_until_stalled();

    {
        let screen = view.screen.borrow();
        assert!(screen.typing);
        assert!(!screen.input_enabled);
        assert!(!screen.welcome_visible);
        assert_eq!(screen.messages.len(), 1);
        assert_eq!(screen.messages[0].class_name, "message user-message");
    }

    release.send(()).unwrap();
    pool.run_until_stalled();

    let screen = view.screen.borrow();
    assert!(!screen.typing);
    assert!(screen.input_enabled);
    assert_eq!(screen.messages.len(), 2);
    assert_eq!(screen.messages[1].class_name, "message bot-message");
    assert!(screen.messages[1].inner_html.contains("<p>Hi</p>"));
    assert!(screen.scrolls > 0);
}

#[test]
fn test_user_text_is_escaped_on_screen() {
    let (gateway, controller, mut pool, view) = setup();
    gateway.reply_with("abc", "<p>ok</p>");

    pool.run_until(controller.submit("<img src=x onerror=alert(1)>"))
        .unwrap();

    let screen = view.screen.borrow();
    let user = &screen.messages[0].inner_html;
    assert!(!user.contains("<img"));
    assert!(user.contains("12:34"));
}

#[test]
fn test_error_reply_rendered() {
    let (gateway, controller, mut pool, view) = setup();
    gateway.fail_next_send();

    pool.run_until(controller.submit("Hello")).unwrap();

    let screen = view.screen.borrow();
    assert_eq!(screen.messages.len(), 2);
    assert!(screen.messages[1].inner_html.contains("error-text"));
    assert!(screen.input_enabled);
    assert!(!screen.typing);
}

#[test]
fn test_sidebar_follows_sessions() {
    let (gateway, controller, mut pool, view) = setup();
    gateway.reply_with("abc", "<p>Hi</p>");
    gateway.title_for("abc", Ok("Greeting"));
    let release = gateway.hold_title("abc");

    pool.run_until(controller.submit("Hello")).unwrap();
    controller.new_session();
    pool.run_until_stalled();

    {
        let screen = view.screen.borrow();
        assert_eq!(screen.sidebar.len(), 1);
        assert_eq!(screen.sidebar[0].title, PLACEHOLDER_TITLE);
        assert!(screen.sidebar[0].title_pending);
        assert!(!screen.sidebar[0].active);
        assert!(screen.welcome_visible);
        assert!(screen.messages.is_empty());
    }

    release.send(()).unwrap();
    pool.run_until_stalled();
    assert_eq!(view.screen.borrow().sidebar[0].title, "Greeting");

    controller.select_session(&SessionId::from("abc")).unwrap();
    let screen = view.screen.borrow();
    assert!(screen.sidebar[0].active);
    assert_eq!(screen.messages.len(), 2);
}

#[test]
fn test_restored_session_rendered_on_attach() {
    let backing = Rc::new(MemoryStore::new());
    {
        let mut store = create_test_store(backing.clone());
        store.append_user_message("left over");
    }

    let mut store = create_test_store(backing);
    assert_eq!(store.active().messages(), &[Message::user("left over")]);

    let view = RecordingView::default();
    RenderPipeline::new(view.clone(), FormatOptions::default())
        .with_clock(fixed_clock)
        .attach(&mut store);

    let screen = view.screen.borrow();
    assert_eq!(screen.messages.len(), 1);
    assert!(!screen.welcome_visible);
    assert!(screen.input_enabled);
}

#[test]
fn test_input_blocked_again_when_pending_session_reopened() {
    let (gateway, controller, mut pool, view) = setup();
    gateway.reply_with("a", "<p>1</p>");
    gateway.reply_with("a", "<p>2</p>");

    pool.run_until(controller.submit("one")).unwrap();
    let release = gateway.hold_next_send();
    let sender = controller.clone();
    pool.spawner()
        .spawn_local(async move {
            sender.submit("two").await.unwrap();
        })
        .unwrap();
    pool.run_until_stalled();

    controller.new_session();
    {
        let screen = view.screen.borrow();
        assert!(!screen.typing);
        assert!(!screen.input_enabled);
    }

    controller.select_session(&SessionId::from("a")).unwrap();
    {
        let screen = view.screen.borrow();
        assert!(screen.typing);
        assert!(!screen.input_enabled);
        assert_eq!(screen.messages.len(), 3);
    }

    release.send(()).unwrap();
    pool.run_until_stalled();

    let screen = view.screen.borrow();
    assert!(!screen.typing);
    assert!(screen.input_enabled);
    assert_eq!(screen.messages.len(), 4);
}
