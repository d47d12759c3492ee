use std::path::PathBuf;
use std::rc::Rc;

use env_logger::Env;

use ember_win::app::{AppError, Application};
use ember_win::config::PlatformConfig;
use ember_win::domain::image::{Image, ImageFormat};
use ember_win::error::ErrorCode;
use ember_win::graphics::GraphicsContextBase;
use ember_win::platform::{NativeWindow, Platform};

const ICON_SIZE: u32 = 16;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(error) = run() {
        std::process::exit(error.code() as i32);
    }
}

fn run() -> Result<(), AppError> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = PlatformConfig::load_or_default(path).map_err(|error| {
        log::error!("[main] {error} (error 0x{:06X})", error.code());
        error
    })?;

    start(config)
}

#[cfg(windows)]
fn start(config: PlatformConfig) -> Result<(), AppError> {
    use ember_win::platform::Win32Platform;

    let platform = Win32Platform::new().map_err(|source| {
        log::error!("[main] {source}");
        AppError::Platform(source)
    })?;

    run_application(Rc::new(platform), config, |_| {})
}

/// Without Win32 the window is closed again right after the first pump
#[cfg(not(windows))]
fn start(config: PlatformConfig) -> Result<(), AppError> {
    use ember_win::platform::{HeadlessPlatform, WindowMessage};

    log::warn!("[main] Win32 is unavailable, running on the headless platform");
    let platform = Rc::new(HeadlessPlatform::new());
    let closer = platform.clone();

    run_application(platform, config, move |window| {
        closer.post_message(window, WindowMessage::Close)
    })
}

fn run_application(
    platform: Rc<dyn Platform>,
    config: PlatformConfig,
    on_shown: impl FnOnce(NativeWindow),
) -> Result<(), AppError> {
    let mut app = Application::new(platform, config)?;
    app.initialise()?;

    for adapter in app.adapters().graphics_adapters() {
        log::info!(
            "[main] {} runs {} ({} modes)",
            adapter.name(),
            adapter.current_display_mode(),
            adapter.supported_display_modes().len()
        );
    }

    let id = app.create_window()?;
    let mut context = app.create_graphics_context(id)?;

    let icon = gradient_icon()?;
    if let Some(window) = app.window_mut(id) {
        window.set_icon(Some(&icon))?;
        window.show();
        on_shown(window.handle());
    }

    let mut frames: u64 = 0;
    loop {
        app.process_messages();
        if !app.has_open_windows() {
            break;
        }

        context.swap_buffers()?;
        frames += 1;
    }
    log::info!("[main] Window closed after {frames} frames");

    context.make_non_current()?;
    context.destroy()?;
    app.destroy_window(id)?;
    app.shutdown()
}

fn gradient_icon() -> Result<Image, AppError> {
    let data = (0..ICON_SIZE * ICON_SIZE)
        .flat_map(|index| {
            let (x, y) = (index % ICON_SIZE, index / ICON_SIZE);
            let shade = |value: u32| (value * 255 / (ICON_SIZE - 1)) as u8;
            [shade(x), shade(y), 160, 255]
        })
        .collect();

    Ok(Image::new(ICON_SIZE, ICON_SIZE, ImageFormat::RGBA8, data)?)
}
