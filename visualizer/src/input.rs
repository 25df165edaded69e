//! Keyboard and mouse handling: quit on Escape, drag to pan, wheel to zoom.

use tracing::{debug, trace};

use crate::error::ViewerError;
use crate::module::{FrameContext, Module, ShutdownReason};
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Left,
    Right,
    Up,
    Down,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

/// Discrete input delivered by the window layer between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    KeyDown(Key),
    KeyUp(Key),
    ButtonDown { button: MouseButton, position: (i32, i32) },
    ButtonUp { button: MouseButton, position: (i32, i32) },
    WheelUp { position: (i32, i32) },
    WheelDown { position: (i32, i32) },
}

/// Which arrow keys are currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrowKeys {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Events queued since the last frame plus the polled device state.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
    pointer: (i32, i32),
    left_held: bool,
    arrows: ArrowKeys,
}

impl InputQueue {
    /// Queue an event and update the polled state it implies.
    pub fn push(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.set_key(key, true),
            InputEvent::KeyUp(key) => self.set_key(key, false),
            InputEvent::ButtonDown { button, position } => {
                self.set_pointer(position);
                self.set_button(button, true);
            }
            InputEvent::ButtonUp { button, position } => {
                self.set_pointer(position);
                self.set_button(button, false);
            }
            _ => {}
        }
        self.events.push(event);
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, InputEvent> {
        self.events.drain(..)
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn set_pointer(&mut self, position: (i32, i32)) {
        self.pointer = position;
    }

    pub fn pointer(&self) -> (i32, i32) {
        self.pointer
    }

    pub fn set_button(&mut self, button: MouseButton, held: bool) {
        if button == MouseButton::Left {
            self.left_held = held;
        }
    }

    pub fn left_held(&self) -> bool {
        self.left_held
    }

    pub fn set_key(&mut self, key: Key, held: bool) {
        match key {
            Key::Left => self.arrows.left = held,
            Key::Right => self.arrows.right = held,
            Key::Up => self.arrows.up = held,
            Key::Down => self.arrows.down = held,
            Key::Escape | Key::Other => {}
        }
    }

    pub fn arrows(&self) -> ArrowKeys {
        self.arrows
    }
}

/// Turns queued input into view changes and shutdown requests.
pub struct InputHandler {
    name: String,
    mouse_pos: (i32, i32),
}

impl InputHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mouse_pos: (0, 0),
        }
    }

    /// Pointer position seen at the last button press, wheel event or drag
    /// poll.
    pub fn mouse_pos(&self) -> (i32, i32) {
        self.mouse_pos
    }

    fn handle_event(&mut self, event: InputEvent, ctx: &mut FrameContext) {
        match event {
            InputEvent::ButtonDown { position, .. }
            | InputEvent::WheelUp { position }
            | InputEvent::WheelDown { position } => self.mouse_pos = position,
            _ => {}
        }
        match event {
            InputEvent::Quit | InputEvent::KeyUp(Key::Escape) => {
                ctx.request_shutdown(ShutdownReason::UserQuit);
            }
            InputEvent::WheelUp { .. } => {
                debug!("mouse wheel up");
                ctx.view.zoom_in();
            }
            InputEvent::WheelDown { .. } => {
                debug!("mouse wheel down");
                ctx.view.zoom_out();
            }
            _ => {}
        }
    }
}

impl Module for InputHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, ctx: &mut FrameContext) {
        let events: Vec<InputEvent> = ctx.input.drain().collect();
        for event in events {
            self.handle_event(event, ctx);
        }

        // Arrow keys are polled but not bound to anything yet.
        let _arrows = ctx.input.arrows();

        if ctx.input.left_held() {
            let (x, y) = ctx.input.pointer();
            let dx = x - self.mouse_pos.0;
            let dy = y - self.mouse_pos.1;
            if dx != 0 || dy != 0 {
                trace!(dx, dy, "drag");
                ctx.view.pan(dx, dy);
            }
            self.mouse_pos = (x, y);
        }
    }

    fn render(&mut self, _ctx: &FrameContext, _surface: &mut Surface) -> Result<(), ViewerError> {
        Ok(())
    }
}
