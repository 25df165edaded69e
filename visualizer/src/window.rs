//! On-screen presentation: a fixed-size winit window backed by a `pixels`
//! frame buffer.

use std::sync::atomic::{AtomicBool, Ordering};

use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::{debug, info};
use winit::dpi::PhysicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::DESCRIPTION;
use crate::app::{FrameStatus, Visualizer};
use crate::error::ViewerError;
use crate::input::{InputEvent, Key, MouseButton};
use crate::module::ShutdownReason;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize frame buffer: {0}")]
    CreateRenderer(#[source] pixels::Error),
    #[error("failed to present frame: {0}")]
    Render(#[source] pixels::Error),
    #[error("failed to resize frame buffer: {0}")]
    Resize(#[source] pixels::TextureError),
    #[error(transparent)]
    Frame(#[from] ViewerError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Open a window the size of the visualizer's display and run frames until a
/// module asks to stop, `interrupted` is raised or something fails. Every
/// module is dropped before this returns.
pub fn run(
    visualizer: &mut Visualizer,
    interrupted: &AtomicBool,
) -> Result<ShutdownReason, WindowError> {
    let (width, height) = (visualizer.display().width(), visualizer.display().height());

    let event_loop = EventLoop::new().map_err(WindowError::CreateEventLoop)?;
    let window = WindowBuilder::new()
        .with_title(DESCRIPTION)
        .with_inner_size(PhysicalSize::new(width, height))
        .with_resizable(false)
        .build(&event_loop)
        .map_err(WindowError::CreateWindow)?;
    let mut pixels = {
        let size = window.inner_size();
        let texture = SurfaceTexture::new(size.width, size.height, &window);
        Pixels::new(width, height, texture).map_err(WindowError::CreateRenderer)?
    };
    info!(width, height, "window open");

    event_loop.set_control_flow(ControlFlow::Poll);
    let window_id = window.id();
    let mut wheel = WheelAccumulator::default();
    let mut outcome = Ok(ShutdownReason::UserQuit);

    let result = event_loop.run(|event, target| {
        if target.exiting() {
            return;
        }
        match event {
            Event::WindowEvent { window_id: id, event } if id == window_id => match event {
                WindowEvent::CloseRequested => visualizer.input_mut().push(InputEvent::Quit),
                WindowEvent::CursorMoved { position, .. } => visualizer
                    .input_mut()
                    .set_pointer((position.x as i32, position.y as i32)),
                WindowEvent::MouseInput { state, button, .. } => {
                    let input = visualizer.input_mut();
                    let button = map_button(button);
                    let position = input.pointer();
                    input.push(match state {
                        ElementState::Pressed => InputEvent::ButtonDown { button, position },
                        ElementState::Released => InputEvent::ButtonUp { button, position },
                    });
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let input = visualizer.input_mut();
                    for notch in wheel.events(delta, input.pointer()) {
                        input.push(notch);
                    }
                }
                WindowEvent::KeyboardInput { event, .. } if !event.repeat => {
                    let key = map_key(event.physical_key);
                    visualizer.input_mut().push(match event.state {
                        ElementState::Pressed => InputEvent::KeyDown(key),
                        ElementState::Released => InputEvent::KeyUp(key),
                    });
                }
                WindowEvent::Resized(size) => {
                    if let Err(e) = pixels.resize_surface(size.width, size.height) {
                        outcome = Err(WindowError::Resize(e));
                        target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if interrupted.load(Ordering::Acquire) {
                    visualizer.interrupt();
                }
                match visualizer.frame() {
                    Ok(FrameStatus::Presented) => {
                        pixels.frame_mut().copy_from_slice(visualizer.display().data());
                        if let Err(e) = pixels.render() {
                            outcome = Err(WindowError::Render(e));
                            target.exit();
                        }
                    }
                    Ok(FrameStatus::Shutdown(reason)) => {
                        outcome = Ok(reason);
                        target.exit();
                    }
                    Err(e) => {
                        outcome = Err(WindowError::Frame(e));
                        target.exit();
                    }
                }
            }
            _ => {}
        }
    });

    visualizer.shutdown();
    debug!("event loop finished");
    result.map_err(WindowError::EventLoopRun)?;
    outcome
}

fn map_key(key: PhysicalKey) -> Key {
    match key {
        PhysicalKey::Code(KeyCode::Escape) => Key::Escape,
        PhysicalKey::Code(KeyCode::ArrowLeft) => Key::Left,
        PhysicalKey::Code(KeyCode::ArrowRight) => Key::Right,
        PhysicalKey::Code(KeyCode::ArrowUp) => Key::Up,
        PhysicalKey::Code(KeyCode::ArrowDown) => Key::Down,
        _ => Key::Other,
    }
}

fn map_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Left,
        winit::event::MouseButton::Right => MouseButton::Right,
        winit::event::MouseButton::Middle => MouseButton::Middle,
        _ => MouseButton::Other,
    }
}

/// Scroll distance of one wheel notch for touchpads and other pixel based
/// devices.
const PIXELS_PER_NOTCH: f64 = 20.0;

/// Turns scroll deltas into whole wheel notches, carrying fractions over to
/// the next delta. Horizontal scrolling is ignored.
#[derive(Debug, Default)]
struct WheelAccumulator {
    remainder: f64,
}

impl WheelAccumulator {
    fn events(&mut self, delta: MouseScrollDelta, position: (i32, i32)) -> Vec<InputEvent> {
        self.remainder += match delta {
            MouseScrollDelta::LineDelta(_, y) => y as f64,
            MouseScrollDelta::PixelDelta(p) => p.y / PIXELS_PER_NOTCH,
        };
        let notches = self.remainder.trunc();
        self.remainder -= notches;

        let event = if notches > 0.0 {
            InputEvent::WheelUp { position }
        } else {
            InputEvent::WheelDown { position }
        };
        vec![event; notches.abs() as usize]
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;

    #[test]
    fn escape_and_arrows_are_recognized() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)), Key::Escape);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ArrowUp)), Key::Up);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyW)), Key::Other);
    }

    #[test]
    fn only_main_buttons_are_distinguished() {
        assert_eq!(map_button(winit::event::MouseButton::Left), MouseButton::Left);
        assert_eq!(map_button(winit::event::MouseButton::Back), MouseButton::Other);
    }

    #[test]
    fn every_line_notch_becomes_an_event() {
        let mut wheel = WheelAccumulator::default();
        let up = InputEvent::WheelUp { position: (3, 4) };
        assert_eq!(wheel.events(MouseScrollDelta::LineDelta(0.0, 3.0), (3, 4)), [up; 3]);

        let down = InputEvent::WheelDown { position: (0, 0) };
        assert_eq!(wheel.events(MouseScrollDelta::LineDelta(0.0, -2.0), (0, 0)), [down; 2]);
    }

    #[test]
    fn pixel_deltas_accumulate_into_notches() {
        let mut wheel = WheelAccumulator::default();
        let delta = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -12.0));
        assert!(wheel.events(delta, (3, 4)).is_empty());
        assert_eq!(
            wheel.events(delta, (3, 4)),
            [InputEvent::WheelDown { position: (3, 4) }]
        );
        // 4 px down are still pending.
        let delta = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 50.0));
        assert_eq!(
            wheel.events(delta, (3, 4)),
            [InputEvent::WheelUp { position: (3, 4) }; 2]
        );
    }

    #[test]
    fn horizontal_scrolling_is_ignored() {
        let mut wheel = WheelAccumulator::default();
        assert!(wheel.events(MouseScrollDelta::LineDelta(2.0, 0.0), (0, 0)).is_empty());
    }
}
