use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::info;
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::WindowBuilder;

use chest_reveal::{LogGallery, RecordingGallery, Renderer, RevealApp};

/// Pixels of drag below which a release still counts as an activation tap.
const TAP_SLOP: f32 = 5.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    if options.headless {
        return run_headless(options.frames);
    }
    match run_interactive() {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --headless mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(options.frames)
            } else {
                Err(err)
            }
        }
    }
}

/// Runs one scripted open/close cycle without a window and prints the
/// state after each beat.
fn run_headless(frames: u32) -> Result<()> {
    let gallery = RecordingGallery::new();
    let (starts, stops) = gallery.counters();
    let mut app = RevealApp::mount(1280, 720, Box::new(gallery))?;
    println!("Mounted chest with {} parts", app.chest().part_count());

    let step = Duration::from_millis(16);
    let mut now = Instant::now();

    app.activate(now);
    println!("Activated: {}", app.summary());

    for _ in 0..frames {
        now += step;
        app.frame(now);
    }
    println!("After open: {}", app.summary());

    app.activate(now);
    for _ in 0..frames {
        now += step;
        app.frame(now);
    }
    println!("After close: {}", app.summary());

    app.unmount();
    println!("Unmounted: {}", app.summary());
    println!(
        "Gallery commands: starts={} stops={}",
        starts.load(Ordering::SeqCst),
        stops.load(Ordering::SeqCst)
    );
    Ok(())
}

fn run_interactive() -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop =
        event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Chest Reveal")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .with_transparent(true)
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let size = window.inner_size();
    let app = RevealApp::mount(size.width, size.height, Box::<LogGallery>::default())
        .context("failed to mount reveal controller")?;
    let renderer = block_on(Renderer::new(Arc::clone(&window), app.chest()))?;

    let mut state = AppState {
        renderer,
        app,
        cursor: Vec2::ZERO,
        press_position: None,
        dragged: false,
        last_error: None,
    };

    let mut event_loop = event_loop;
    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        if let Err(err) = state.process_event(&event, control_flow) {
            state.last_error = Some(err);
            control_flow.set_exit();
        }
    });

    state.shutdown()
}

struct AppState {
    renderer: Renderer,
    app: RevealApp,
    cursor: Vec2,
    press_position: Option<Vec2>,
    dragged: bool,
    last_error: Option<anyhow::Error>,
}

impl AppState {
    fn process_event(&mut self, event: &Event<()>, control_flow: &mut ControlFlow) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(*size);
                        self.app.resize(size.width, size.height);
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        self.renderer.resize(**new_inner_size);
                        self.app.resize(new_inner_size.width, new_inner_size.height);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        self.pointer_moved(position.x as f32, position.y as f32);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        if *button == MouseButton::Left {
                            match state {
                                ElementState::Pressed => self.pointer_pressed(self.cursor),
                                ElementState::Released => self.pointer_released(),
                            }
                        }
                    }
                    WindowEvent::Touch(touch) => self.handle_touch(touch),
                    _ => {}
                }
            }
            Event::RedrawRequested(window_id) if *window_id == self.renderer.window_id() => {
                self.app.frame(Instant::now());
                if self.app.context().renderable() {
                    let orbit = *self.app.orbit();
                    let result = self.renderer.render(
                        self.app.chest(),
                        self.app.context(),
                        orbit.yaw(),
                        orbit.pitch(),
                        self.app.lid_angle(),
                    );
                    if let Err(err) = result {
                        match err {
                            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                                let size = self.renderer.window().inner_size();
                                self.renderer.resize(size);
                            }
                            wgpu::SurfaceError::OutOfMemory => {
                                return Err(anyhow!("GPU is out of memory"));
                            }
                            wgpu::SurfaceError::Timeout => {
                                info!("surface timeout; retrying next frame");
                            }
                        }
                    }
                }
            }
            Event::MainEventsCleared => {
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    /// Mouse and single-touch both land here; the same delta path feeds the
    /// orbit either way.
    fn pointer_pressed(&mut self, position: Vec2) {
        self.press_position = Some(position);
        self.dragged = false;
        self.app.orbit_mut().pointer_down(position.x, position.y);
    }

    fn pointer_moved(&mut self, x: f32, y: f32) {
        self.cursor = Vec2::new(x, y);
        if self.app.orbit_mut().pointer_move(x, y) {
            if let Some(press) = self.press_position {
                if self.cursor.distance(press) > TAP_SLOP {
                    self.dragged = true;
                }
            }
        }
    }

    fn pointer_released(&mut self) {
        self.app.orbit_mut().pointer_up();
        let was_tap = !self.dragged && self.press_position.is_some();
        self.press_position = None;
        if was_tap {
            self.app.activate(Instant::now());
        }
    }

    fn handle_touch(&mut self, touch: &Touch) {
        let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
        match touch.phase {
            TouchPhase::Started => self.pointer_pressed(position),
            TouchPhase::Moved => self.pointer_moved(position.x, position.y),
            TouchPhase::Ended | TouchPhase::Cancelled => self.pointer_released(),
        }
    }

    fn shutdown(mut self) -> Result<()> {
        self.app.unmount();
        self.renderer.dispose();
        match self.last_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct CliOptions {
    headless: bool,
    frames: u32,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut headless = false;
        let mut frames = 150;
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--headless" => headless = true,
                "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames requires a value"))?;
                    frames = value
                        .parse::<u32>()
                        .with_context(|| format!("invalid frame count: {value}"))?;
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Usage: chest-reveal [--headless] [--frames N]"
                    ));
                }
            }
        }
        Ok(Self { headless, frames })
    }
}
