use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::answer::AnswerService;
use crate::app::{App, ServiceStatus};
use crate::error::AnswerError;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent, events: &UnboundedSender<AppEvent>) {
    match event {
        AppEvent::Key(key) => handle_key(app, key, events),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(outcome) => {
            // A reply is fresher evidence of reachability than the startup probe
            match &outcome {
                Ok(_) => app.service_status = ServiceStatus::Online,
                Err(AnswerError::Transport(_)) => app.service_status = ServiceStatus::Offline,
                Err(_) => {}
            }
            app.session.settle(outcome);
            app.cursor = app.cursor.min(app.session.pending_input().chars().count());
        }
        AppEvent::Health(online) => {
            app.service_status = if online {
                ServiceStatus::Online
            } else {
                ServiceStatus::Offline
            };
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, events: &UnboundedSender<AppEvent>) {
    // Keys that work regardless of the input lock
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }
        KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Up => return app.scroll_up(1),
        KeyCode::Down => return app.scroll_down(1),
        KeyCode::PageUp => return app.scroll_page_up(),
        KeyCode::PageDown => return app.scroll_page_down(),
        KeyCode::Enter => return submit_input(app, events),
        _ => {}
    }

    if app.input_locked() {
        return;
    }

    let mut input = app.session.pending_input().to_string();
    let char_count = input.chars().count();

    match key.code {
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&input, app.cursor);
                input.remove(byte_pos);
                app.session.update_input(input);
            }
        }
        KeyCode::Delete => {
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&input, app.cursor);
                input.remove(byte_pos);
                app.session.update_input(input);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = char_count;
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let byte_pos = char_to_byte_index(&input, app.cursor);
            input.insert(byte_pos, c);
            app.cursor += 1;
            app.session.update_input(input);
        }
        _ => {}
    }
}

/// Start a submission and spawn the request; the outcome comes back as
/// [`AppEvent::Reply`].
fn submit_input(app: &mut App, events: &UnboundedSender<AppEvent>) {
    let text = app.session.pending_input().to_string();
    let Some(input) = app.session.begin_submit(&text) else {
        return;
    };

    info!(endpoint = %app.client.endpoint(), "Question submitted");

    let client = app.client.clone();
    let tx = events.clone();
    tokio::spawn(async move {
        let outcome = client.ask(&input).await;
        if tx.send(AppEvent::Reply(outcome)).is_err() {
            debug!("Event loop closed before the reply settled");
        }
    });
}

/// Report reachability of the service as [`AppEvent::Health`].
pub fn spawn_health_check(app: &App, events: &UnboundedSender<AppEvent>) -> JoinHandle<()> {
    let client = app.client.clone();
    let tx = events.clone();
    tokio::spawn(async move {
        let online = client.health().await;
        if tx.send(AppEvent::Health(online)).is_err() {
            debug!("Event loop closed before the health check finished");
        }
    })
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);

    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}
