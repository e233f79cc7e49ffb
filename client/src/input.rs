//! Client input: keyboard and mouse sampling, and turning events into frames

use crate::cache::{ClientCache, MoveError};
use crate::rendering::BoardLayout;
use log::{debug, info};
use macroquad::prelude::*;
use shared::Frame;
use std::sync::Arc;

/// Chat lines longer than this are cut before sending
pub const MAX_CHAT_LEN: usize = 200;

/// What the player asked for, independent of how they asked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Cell 1-9, row-major from the top-left
    SelectCell(u8),
    ToggleChat,
    ChatText(String),
    Reset,
}

/// Applies input events to the cache and yields the frame to send, if any
pub struct InputDispatcher {
    cache: Arc<ClientCache>,
}

impl InputDispatcher {
    pub fn new(cache: Arc<ClientCache>) -> Self {
        Self { cache }
    }

    pub fn handle(&self, event: InputEvent) -> Option<Frame> {
        match event {
            InputEvent::SelectCell(index) => match self.cache.claim_move(index) {
                Ok(mv) => {
                    debug!("Sending move {:?}", mv);
                    Some(Frame::Move(mv))
                }
                Err(MoveError::Occupied(_)) => {
                    self.cache.set_status(format!("Cell {} is taken", index));
                    None
                }
                Err(e) => {
                    debug!("Ignoring cell {}: {}", index, e);
                    None
                }
            },
            InputEvent::ToggleChat => {
                let chat_mode = self.cache.toggle_chat_mode();
                debug!("Chat mode: {}", chat_mode);
                None
            }
            InputEvent::ChatText(text) => {
                let text: String = text
                    .chars()
                    .filter(|c| *c != '\n' && *c != '\r')
                    .take(MAX_CHAT_LEN)
                    .collect();
                if text.trim().is_empty() {
                    return None;
                }
                self.cache.record_sent_chat(&text);
                Some(Frame::Chat(text))
            }
            InputEvent::Reset => {
                info!("Requesting board reset");
                Some(Frame::Reset)
            }
        }
    }
}

/// Samples macroquad's keyboard and mouse once per frame
pub struct KeyboardInput {
    chat_buffer: String,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self {
            chat_buffer: String::new(),
        }
    }

    /// The chat line being typed
    pub fn chat_buffer(&self) -> &str {
        &self.chat_buffer
    }

    pub fn poll(&mut self, chat_mode: bool, layout: &BoardLayout) -> Vec<InputEvent> {
        let mut events = Vec::new();

        if chat_mode {
            self.poll_chat(&mut events);
            return events;
        }

        // characters typed outside chat mode must not leak into the next line
        while get_char_pressed().is_some() {}

        if is_key_pressed(KeyCode::Key0) || is_key_pressed(KeyCode::Kp0) {
            events.push(InputEvent::ToggleChat);
        }
        if is_key_pressed(KeyCode::R) {
            events.push(InputEvent::Reset);
        }

        for (index, (key, keypad)) in CELL_KEYS.iter().enumerate() {
            if is_key_pressed(*key) || is_key_pressed(*keypad) {
                events.push(InputEvent::SelectCell(index as u8 + 1));
            }
        }

        if is_mouse_button_pressed(MouseButton::Left) {
            let (x, y) = mouse_position();
            if let Some(index) = layout.cell_at(x, y) {
                events.push(InputEvent::SelectCell(index));
            }
        }

        events
    }

    fn poll_chat(&mut self, events: &mut Vec<InputEvent>) {
        while let Some(c) = get_char_pressed() {
            if !c.is_control() && self.chat_buffer.chars().count() < MAX_CHAT_LEN {
                self.chat_buffer.push(c);
            }
        }

        if is_key_pressed(KeyCode::Backspace) {
            self.chat_buffer.pop();
        }
        if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter) {
            let line = std::mem::take(&mut self.chat_buffer);
            events.push(InputEvent::ChatText(line));
        }
        if is_key_pressed(KeyCode::Escape) {
            events.push(InputEvent::ToggleChat);
        }
    }
}

impl Default for KeyboardInput {
    fn default() -> Self {
        Self::new()
    }
}

const CELL_KEYS: [(KeyCode, KeyCode); 9] = [
    (KeyCode::Key1, KeyCode::Kp1),
    (KeyCode::Key2, KeyCode::Kp2),
    (KeyCode::Key3, KeyCode::Kp3),
    (KeyCode::Key4, KeyCode::Kp4),
    (KeyCode::Key5, KeyCode::Kp5),
    (KeyCode::Key6, KeyCode::Kp6),
    (KeyCode::Key7, KeyCode::Kp7),
    (KeyCode::Key8, KeyCode::Kp8),
    (KeyCode::Key9, KeyCode::Kp9),
];
