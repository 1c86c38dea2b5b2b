//! Minimal bootstrap demo: negotiate a full Vulkan context for a window of the
//! resolution given on the command line, then idle until the window closes.
//! Resizes re-run only the presentation negotiation.

use std::env;

use anyhow::{bail, Result};
use log::{error, info};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::WindowBuilder;

use deimos::prelude::*;

/// The two positional arguments: width and height in pixels. Wrong count or
/// non-integer input is a usage error, reported before any negotiation begins.
fn parse_resolution() -> Result<(u32, u32)> {
    let args: Vec<String> = env::args().skip(1).collect();
    let [width, height] = args.as_slice() else {
        bail!("usage: init <width> <height>");
    };
    Ok((width.parse()?, height.parse()?))
}

fn run() -> Result<()> {
    let (width, height) = parse_resolution()?;

    let mut event_loop = EventLoopBuilder::new().build();
    let window = WindowBuilder::new()
        .with_title("deimos init")
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)?;

    let settings = AppBuilder::new(&window)
        .name("deimos init")
        .version((0, 1, 0))
        .build();

    let mut context = deimos::initialize(&settings)?;
    let extent = context.swapchain().extent();
    info!(
        "Negotiated a {}x{} swap chain on queue family {}. Press Escape to exit.",
        extent.width,
        extent.height,
        context.queues().graphics.family()
    );

    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Wait;
        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                *control_flow = ControlFlow::Exit;
            }
            Event::WindowEvent {
                event:
                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                state: ElementState::Pressed,
                                virtual_keycode: Some(VirtualKeyCode::Escape),
                                ..
                            },
                        ..
                    },
                ..
            } => {
                *control_flow = ControlFlow::Exit;
            }
            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => {
                // A zero-sized drawable area (minimized window) has nothing to
                // present to; skip recreation until it comes back.
                if size.width > 0 && size.height > 0 {
                    if let Err(error) = context.resize(size.width, size.height) {
                        error!("Swap chain recreation failed: {error:#}");
                        *control_flow = ControlFlow::Exit;
                    }
                }
            }
            _ => {}
        }
    });

    context.wait_idle()?;
    Ok(())
}

fn main() {
    pretty_env_logger::init_timed();
    // Single top-level handler: every negotiation failure is fatal, so log the
    // diagnostic and terminate with a non-zero exit code.
    if let Err(error) = run() {
        error!("Fatal: {error:#}");
        std::process::exit(1);
    }
}
