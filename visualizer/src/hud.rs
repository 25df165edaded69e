//! Info panel in the top-left corner: server and client frame rates.

use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use sim_client::Timestamp;
use tracing::trace;

use crate::clock::RateCounter;
use crate::error::ViewerError;
use crate::font::HudFont;
use crate::module::{FrameContext, Module};
use crate::surface::{Color, Rect, Surface};

/// Pending server ticks before new ones are dropped.
pub const TICK_CHANNEL_CAPACITY: usize = 256;

const PANEL_WIDTH: u32 = 220;
const PANEL_ALPHA: u8 = 100;
const LINE_TOP: i32 = 4;
const LINE_STEP: i32 = 18;
const LABEL_X: i32 = 8;
const BAR_X: f32 = 100.0;
const BAR_WIDTH: f32 = 106.0;
const MARK_SIZE: f32 = 6.0;
const GRAPH_HEIGHT: f32 = 30.0;

/// One server tick as seen by the client.
#[derive(Debug, Clone)]
pub struct ServerTick {
    pub timestamp: Timestamp,
    pub received_at: Instant,
}

impl ServerTick {
    pub fn now(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            received_at: Instant::now(),
        }
    }
}

/// A row of the info panel.
#[derive(Debug, Clone, PartialEq)]
pub enum HudLine {
    Text(String),
    /// Samples in `0.0..=1.0`, one pixel apart.
    Graph(Vec<f32>),
    Toggle { label: String, on: bool },
    Gauge { label: String, value: f32, min: f32, max: f32 },
}

pub struct Hud {
    name: String,
    height: u32,
    show_info: bool,
    lines: Vec<HudLine>,
    panel: Surface,
    font: Option<HudFont>,
    server_rate: RateCounter,
    last_server_tick: Option<ServerTick>,
    ticks_tx: Sender<ServerTick>,
    ticks_rx: Receiver<ServerTick>,
}

impl Hud {
    pub fn new(
        name: impl Into<String>,
        height: u32,
        font: Option<HudFont>,
    ) -> Result<Self, ViewerError> {
        let mut panel = Surface::new(PANEL_WIDTH, height)?;
        panel.fill(Color::BLACK);
        let (ticks_tx, ticks_rx) = crossbeam_channel::bounded(TICK_CHANNEL_CAPACITY);
        Ok(Self {
            name: name.into(),
            height,
            show_info: true,
            lines: Vec::new(),
            panel,
            font,
            server_rate: RateCounter::new(),
            last_server_tick: None,
            ticks_tx,
            ticks_rx,
        })
    }

    /// Sending half of the server tick channel. Senders must not block:
    /// use `try_send` and drop the tick when the channel is full.
    pub fn server_tick_sender(&self) -> Sender<ServerTick> {
        self.ticks_tx.clone()
    }

    pub fn lines(&self) -> &[HudLine] {
        &self.lines
    }

    pub fn set_lines(&mut self, lines: Vec<HudLine>) {
        self.lines = lines;
    }

    /// The newest tick received from the server, if any.
    pub fn last_server_tick(&self) -> Option<&ServerTick> {
        self.last_server_tick.as_ref()
    }

    fn drain_server_ticks(&mut self) {
        for tick in self.ticks_rx.try_iter() {
            self.server_rate.record_at(tick.received_at);
            self.last_server_tick = Some(tick);
        }
    }

    fn draw_label(&self, surface: &mut Surface, label: &str, v_offset: i32) {
        if let Some(font) = &self.font {
            font.draw_text(surface, label, (LABEL_X, v_offset), Color::WHITE);
        }
    }
}

fn rate_line(label: &str, fps: f64) -> HudLine {
    HudLine::Text(format!("{label}:  {:>16} FPS", fps as i64))
}

impl Module for Hud {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, ctx: &mut FrameContext) {
        if !self.show_info {
            return;
        }
        self.drain_server_ticks();
        self.lines = vec![
            rate_line("Server", self.server_rate.rate()),
            rate_line("Client", ctx.clock.fps()),
        ];
        trace!(lines = ?self.lines, "hud updated");
    }

    fn render(&mut self, _ctx: &FrameContext, surface: &mut Surface) -> Result<(), ViewerError> {
        if !self.show_info {
            return Ok(());
        }
        surface.blit(&self.panel, (0, 0), PANEL_ALPHA as f32 / 255.0);

        let mut v_offset = LINE_TOP;
        for line in &self.lines {
            if v_offset + LINE_STEP > self.height as i32 {
                break;
            }
            let row = (v_offset + 8) as f32;
            match line {
                HudLine::Graph(samples) => {
                    if samples.len() > 1 {
                        let points: Vec<(i32, i32)> = samples
                            .iter()
                            .enumerate()
                            .map(|(x, y)| {
                                (x as i32 + 8, (row + (1.0 - y) * GRAPH_HEIGHT) as i32)
                            })
                            .collect();
                        surface.draw_lines(Color::ORANGE, &points, 2.0);
                    }
                    // The plot spans two rows.
                    v_offset += LINE_STEP;
                }
                HudLine::Toggle { label, on } => {
                    let mark = Rect::at(BAR_X, row).of_size(MARK_SIZE, MARK_SIZE);
                    surface.draw_rect(Color::WHITE, mark, if *on { 0.0 } else { 1.0 });
                    self.draw_label(surface, label, v_offset);
                }
                HudLine::Gauge {
                    label,
                    value,
                    min,
                    max,
                } => {
                    let border = Rect::at(BAR_X, row).of_size(BAR_WIDTH, MARK_SIZE);
                    surface.draw_rect(Color::WHITE, border, 1.0);
                    let f = (value - min) / (max - min);
                    if *min < 0.0 {
                        let x = BAR_X + f * (BAR_WIDTH - MARK_SIZE);
                        let mark = Rect::at(x, row).of_size(MARK_SIZE, MARK_SIZE);
                        surface.draw_rect(Color::WHITE, mark, 0.0);
                    } else {
                        let bar = Rect::at(BAR_X, row).of_size(f * BAR_WIDTH, MARK_SIZE);
                        surface.draw_rect(Color::WHITE, bar, 0.0);
                    }
                    self.draw_label(surface, label, v_offset);
                }
                HudLine::Text(label) => self.draw_label(surface, label, v_offset),
            }
            v_offset += LINE_STEP;
        }
        Ok(())
    }

    fn server_tick_sink(&self) -> Option<Sender<ServerTick>> {
        Some(self.server_tick_sender())
    }
}
