#![deny(missing_docs)]

//! Entry point for the penguin species prediction form.
use std::path::Path;

use eframe::egui;
use egui::viewport::IconData;
use penguin_predictor::form::{FORM_TITLE, FormApp, FormPaths, HEADER_IMAGE};
use penguin_predictor::{config, logging};
use tracing::warn;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = logging::init("penguin-predictor") {
        eprintln!("Logging disabled: {err}");
    }

    let (paths, settings_error) = resolve_paths();

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size([560.0, 760.0])
        .with_min_inner_size([420.0, 480.0]);
    if let Some(icon) = load_app_icon(&paths.images_dir.join(HEADER_IMAGE)) {
        viewport = viewport.with_icon(icon);
    }
    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        FORM_TITLE,
        native_options,
        Box::new(move |_cc| {
            let app: Box<dyn eframe::App> = match settings_error {
                Some(message) => Box::new(SettingsFailure { message }),
                None => Box::new(FormApp::new(paths)),
            };
            Ok(app)
        }),
    )?;
    Ok(())
}

/// Form paths from `config.toml`, or the defaults plus the load error.
fn resolve_paths() -> (FormPaths, Option<String>) {
    match config::load_or_default() {
        Ok(settings) => (settings.paths.form_paths(), None),
        Err(err) => {
            warn!("Falling back to default paths: {err}");
            let fallback = config::AppConfig::default().paths.form_paths();
            (fallback, Some(err.to_string()))
        }
    }
}

/// The header artwork doubles as the window icon when present.
fn load_app_icon(path: &Path) -> Option<IconData> {
    let bytes = std::fs::read(path).ok()?;
    decode_icon(&bytes).or_else(|| {
        warn!("{} is not a usable window icon", path.display());
        None
    })
}

fn decode_icon(bytes: &[u8]) -> Option<IconData> {
    let rgba = image::load_from_memory(bytes).ok()?.into_rgba8();
    Some(IconData {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

/// Shown instead of the form when `config.toml` cannot be read.
struct SettingsFailure {
    message: String,
}

impl eframe::App for SettingsFailure {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.heading("Palmer Penguin Predictor could not read its settings");
                ui.add_space(8.0);
                ui.label(&self.message);
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn png_bytes_decode_to_icon() {
        let image = image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let icon = decode_icon(&bytes).unwrap();
        assert_eq!((icon.width, icon.height), (4, 3));
        assert_eq!(icon.rgba.len(), 4 * 3 * 4);
    }

    #[test]
    fn garbage_is_not_an_icon() {
        assert!(decode_icon(b"not an image").is_none());
        assert!(load_app_icon(Path::new("/nonexistent/icon.png")).is_none());
    }
}
