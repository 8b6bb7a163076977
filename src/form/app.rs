use std::collections::HashMap;
use std::path::PathBuf;

use eframe::egui;
use egui::{Color32, RichText, TextureHandle, TextureOptions};
use tracing::{info, warn};

use super::catalog::{list_models, model_path};
use super::images::{GENERIC_IMAGE, HEADER_IMAGE, load_color_image};
use super::predictor::{Prediction, predict_one};
use super::session::{FeatureField, SessionId, SessionMemo};
use super::FormError;
use crate::ml::ModelArtifact;

const IMAGE_MAX_WIDTH: f32 = 420.0;
/// Page heading and window title.
pub const FORM_TITLE: &str = "Palmer Penguin Predictor";

/// Directories the form reads from.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPaths {
    pub processed_dir: PathBuf,
    pub models_dir: PathBuf,
    pub images_dir: PathBuf,
}

/// egui front-end over the persisted artifacts.
pub struct FormApp {
    paths: FormPaths,
    session: SessionId,
    memo: SessionMemo,
    models: Vec<String>,
    selected: Option<String>,
    values: Vec<f64>,
    prediction: Option<Prediction>,
    status: Option<String>,
    textures: HashMap<PathBuf, Option<TextureHandle>>,
}

impl FormApp {
    pub fn new(paths: FormPaths) -> Self {
        let session = SessionId::new();
        info!("Starting form session {session}");
        let mut app = Self {
            paths,
            session,
            memo: SessionMemo::new(),
            models: Vec::new(),
            selected: None,
            values: Vec::new(),
            prediction: None,
            status: None,
            textures: HashMap::new(),
        };
        app.refresh_models();
        app
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn selected_model(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select_model(&mut self, stem: &str) {
        self.selected = Some(stem.to_string());
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Set the input for `index`, clamped into its field range.
    pub fn set_value(&mut self, index: usize, value: f64) -> Result<(), FormError> {
        let fields = self.fields()?;
        if let (Some(field), Some(slot)) = (fields.get(index), self.values.get_mut(index)) {
            *slot = field.range.clamp(value);
        }
        Ok(())
    }

    /// Re-list the models directory, keeping the selection when it survives.
    pub fn refresh_models(&mut self) {
        match list_models(&self.paths.models_dir) {
            Ok(models) => {
                self.models = models;
                if self.models.is_empty() {
                    self.status = Some(format!(
                        "No models in {}; run penguin-train first",
                        self.paths.models_dir.display()
                    ));
                }
            }
            Err(err) => {
                warn!("{err}");
                self.models.clear();
                self.status = Some(err.to_string());
            }
        }
        let keep = self
            .selected
            .as_ref()
            .is_some_and(|stem| self.models.contains(stem));
        if !keep {
            self.selected = self.models.first().cloned();
        }
    }

    /// Field ranges for this session, with inputs initialised to each minimum.
    pub fn fields(&mut self) -> Result<Vec<FeatureField>, FormError> {
        let fields = self
            .memo
            .field_ranges(self.session, &self.paths.processed_dir)?
            .to_vec();
        if self.values.len() != fields.len() {
            self.values = fields.iter().map(|field| field.range.min).collect();
        }
        Ok(fields)
    }

    /// Predict the species for the current inputs with the selected model.
    pub fn submit(&mut self) -> Result<&Prediction, FormError> {
        let stem = self.selected.clone().ok_or(FormError::NoModelSelected)?;
        let fields = self.fields()?;
        let model = ModelArtifact::load_json(&model_path(&self.paths.models_dir, &stem))?;
        let encoder = self.memo.label_space(self.session, &self.paths.processed_dir)?;
        let prediction = predict_one(&model, encoder, &fields, &self.values)?;
        info!(
            "Model {stem} predicted {} for {:?}",
            prediction.label, self.values
        );
        self.status = None;
        Ok(self.prediction.insert(prediction))
    }

    fn show_image(&mut self, ui: &mut egui::Ui, file_name: &str, report_missing: bool) {
        let path = self.paths.images_dir.join(file_name);
        let texture = self.textures.entry(path.clone()).or_insert_with(|| {
            match load_color_image(&path) {
                Ok(image) => Some(ui.ctx().load_texture(file_name, image, TextureOptions::LINEAR)),
                Err(err) => {
                    warn!("{err}");
                    None
                }
            }
        });
        match texture {
            Some(texture) => {
                let size = texture.size_vec2();
                let scale = (IMAGE_MAX_WIDTH / size.x.max(1.0)).min(1.0);
                ui.add(egui::Image::new(egui::load::SizedTexture::new(
                    texture.id(),
                    size * scale,
                )));
            }
            None if report_missing => {
                ui.label(RichText::new(format!("Image not available: {file_name}")).italics());
            }
            None => {}
        }
    }

    fn model_picker(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let selected = self.selected.clone();
            egui::ComboBox::from_label("Model")
                .selected_text(selected.as_deref().unwrap_or("No models found"))
                .show_ui(ui, |ui| {
                    for stem in &self.models {
                        ui.selectable_value(&mut self.selected, Some(stem.clone()), stem);
                    }
                });
            if ui.button("Refresh").clicked() {
                self.refresh_models();
            }
        });
    }

    fn inputs(&mut self, ui: &mut egui::Ui) {
        let fields = match self.fields() {
            Ok(fields) => fields,
            Err(err) => {
                self.status = Some(err.to_string());
                return;
            }
        };
        egui::Grid::new("feature_inputs")
            .num_columns(3)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                for (field, value) in fields.iter().zip(self.values.iter_mut()) {
                    ui.label(&field.name);
                    ui.add(
                        egui::DragValue::new(value)
                            .range(field.range.min..=field.range.max)
                            .speed(field.range.step),
                    );
                    ui.label(
                        RichText::new(format!(
                            "{} to {}, step {}",
                            field.range.min, field.range.max, field.range.step
                        ))
                        .weak(),
                    );
                    ui.end_row();
                }
            });
    }
}

impl eframe::App for FormApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            match &self.status {
                Some(status) => ui.colored_label(Color32::from_rgb(220, 90, 90), status),
                None => ui.label(format!("Session {}", self.session)),
            };
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.show_image(ui, HEADER_IMAGE, false);
                ui.heading(FORM_TITLE);
                ui.add_space(8.0);
                self.model_picker(ui);
                ui.add_space(8.0);
                self.inputs(ui);
                ui.add_space(8.0);
                if ui.button("Predict").clicked()
                    && let Err(err) = self.submit()
                {
                    warn!("{err}");
                    self.status = Some(err.to_string());
                }
                ui.separator();
                match self.prediction.clone() {
                    Some(prediction) => {
                        ui.heading(prediction.headline());
                        self.show_image(ui, &prediction.image_name(), true);
                    }
                    None => self.show_image(ui, GENERIC_IMAGE, true),
                }
            });
        });
    }
}
