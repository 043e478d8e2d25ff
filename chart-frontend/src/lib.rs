use signal_core::{AxisRange, ChannelGroup, SlidingWindow, WindowSet};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

const BACKGROUND: &str = "#0f1724";
const GRID: &str = "#1f2a3a";
const AXIS_TEXT: &str = "#9ea7b3";
const FONT: &str = "12px 'Inter', sans-serif";
const GRID_DIVISIONS: usize = 4;

/// Drawing primitives a chart needs. The browser build draws on a 2d canvas.
pub trait RendererBackend {
    fn begin_frame(&mut self, width: f64, height: f64, clear_color: &str);
    fn draw_polyline(&mut self, points: &[(f64, f64)], color: &str, width: f32);
    fn draw_segments(&mut self, segments: &[(f64, f64, f64, f64)], color: &str, width: f32);
    fn draw_text(&mut self, text: &str, x: f64, y: f64, color: &str);
}

/// Plot area inside the canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotRect {
    /// Leaves room for y labels on the left and title/legend on top.
    pub fn inset(width: f64, height: f64) -> Self {
        let left = 48.0_f64.min(width * 0.5);
        let top = 24.0_f64.min(height * 0.5);
        let bottom = 8.0_f64.min(height * 0.25);
        Self {
            left,
            top,
            width: (width - left - 8.0).max(1.0),
            height: (height - top - bottom).max(1.0),
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn y_for(&self, range: &AxisRange, v: f64) -> f64 {
        self.bottom() - range.normalize(v) * self.height
    }
}

/// Map a window onto the plot: oldest sample at the left edge, newest at the
/// right, values clamped to the fixed axis range.
pub fn project_points(window: &SlidingWindow, range: &AxisRange, rect: &PlotRect) -> Vec<(f64, f64)> {
    let n = window.len();
    let step = if n > 1 { rect.width / (n - 1) as f64 } else { 0.0 };
    window
        .iter()
        .enumerate()
        .map(|(i, v)| (rect.left + step * i as f64, rect.y_for(range, v)))
        .collect()
}

/// Horizontal grid lines with their axis labels, bottom to top.
pub fn grid_lines(range: &AxisRange, rect: &PlotRect) -> Vec<(f64, String)> {
    (0..=GRID_DIVISIONS)
        .map(|i| {
            let value = range.min + range.span() * i as f64 / GRID_DIVISIONS as f64;
            (rect.y_for(range, value), format_tick(value))
        })
        .collect()
}

fn format_tick(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v:.1}")
    }
}

/// Draw one channel group: grid, traces in channel order, then title and legend.
pub fn draw_group<B: RendererBackend>(
    backend: &mut B,
    group: ChannelGroup,
    windows: &WindowSet,
    width: f64,
    height: f64,
) {
    let range = group.axis_range();
    let rect = PlotRect::inset(width, height);
    backend.begin_frame(width, height, BACKGROUND);

    let grid = grid_lines(&range, &rect);
    let segments: Vec<_> = grid
        .iter()
        .map(|(y, _)| (rect.left, *y, rect.right(), *y))
        .collect();
    backend.draw_segments(&segments, GRID, 1.0);
    for (y, label) in &grid {
        backend.draw_text(label, 4.0, y + 4.0, AXIS_TEXT);
    }

    for (channel, window) in windows.group(group) {
        let points = project_points(window, &range, &rect);
        backend.draw_polyline(&points, channel.color(), 1.5);
    }

    let title = if group.unit().is_empty() {
        group.title().to_string()
    } else {
        format!("{} ({})", group.title(), group.unit())
    };
    backend.draw_text(&title, rect.left, 16.0, AXIS_TEXT);
    let mut x = rect.right() - 200.0_f64.min(rect.width);
    for channel in group.channels() {
        backend.draw_text(channel.label(), x, 16.0, channel.color());
        x += 8.0 * channel.label().len() as f64 + 16.0;
    }
}

#[cfg(target_arch = "wasm32")]
struct CanvasBackend {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

#[cfg(target_arch = "wasm32")]
impl CanvasBackend {
    fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        Self { canvas, ctx }
    }
}

#[cfg(target_arch = "wasm32")]
impl RendererBackend for CanvasBackend {
    fn begin_frame(&mut self, width: f64, height: f64, clear_color: &str) {
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
        self.ctx.set_fill_style_str(clear_color);
        self.ctx.fill_rect(0.0, 0.0, width, height);
    }

    fn draw_polyline(&mut self, points: &[(f64, f64)], color: &str, width: f32) {
        if points.len() < 2 {
            return;
        }
        let ctx = &self.ctx;
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(width as f64);
        ctx.begin_path();
        ctx.move_to(points[0].0, points[0].1);
        for p in points.iter().skip(1) {
            ctx.line_to(p.0, p.1);
        }
        ctx.stroke();
    }

    fn draw_segments(&mut self, segments: &[(f64, f64, f64, f64)], color: &str, width: f32) {
        if segments.is_empty() {
            return;
        }
        let ctx = &self.ctx;
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(width as f64);
        for (x1, y1, x2, y2) in segments {
            ctx.begin_path();
            ctx.move_to(*x1, *y1);
            ctx.line_to(*x2, *y2);
            ctx.stroke();
        }
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, color: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx.set_font(FONT);
        self.ctx.fill_text(text, x, y).ok();
    }
}

/// Live line chart for one channel group, bound to a canvas element.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct SignalChart {
    group: ChannelGroup,
    backend: CanvasBackend,
    destroyed: bool,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl SignalChart {
    /// `group` is `accel`, `gyro` or `emg`.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, group: &str) -> Result<SignalChart, JsValue> {
        let group = match group.to_ascii_lowercase().as_str() {
            "accel" => ChannelGroup::Accel,
            "gyro" => ChannelGroup::Gyro,
            "emg" => ChannelGroup::Emg,
            _ => return Err(JsValue::from_str("unknown channel group")),
        };
        Self::for_group(canvas_id, group)
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
    }
}

#[cfg(target_arch = "wasm32")]
impl SignalChart {
    pub fn for_group(canvas_id: &str, group: ChannelGroup) -> Result<SignalChart, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let element = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas not found"))?;

        let canvas: HtmlCanvasElement = element
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("element is not a canvas"))?;

        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(SignalChart {
            group,
            backend: CanvasBackend::new(canvas, context),
            destroyed: false,
        })
    }

    /// Redraw from the full window contents, sized to the canvas' layout box.
    pub fn render(&mut self, windows: &WindowSet) {
        if self.destroyed {
            return;
        }
        let rect = self.backend.canvas.get_bounding_client_rect();
        let width = rect.width().max(1.0);
        let height = rect.height().max(1.0);
        draw_group(&mut self.backend, self.group, windows, width, height);
    }
}
