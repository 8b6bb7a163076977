mod support;

use penguin_predictor::dataset::{PrepareOptions, prepare};
use penguin_predictor::form::{
    FormApp, FormPaths, SessionId, SessionMemo, list_models, model_path, predict_one,
};
use penguin_predictor::ml::{
    EvalSplit, LOSS_PLOT_FILE, ModelArtifact, Objective, TrainError, Trainer, plot_loss_curves,
};
use support::penguins::{centre, write_penguins_csv};
use tempfile::tempdir;

struct Workspace {
    _dir: tempfile::TempDir,
    root: std::path::PathBuf,
}

impl Workspace {
    fn prepared(per_class: usize) -> Self {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let input = write_penguins_csv(&root, per_class);
        let summary = prepare(&PrepareOptions {
            input,
            out_dir: root.join("processed"),
            ..PrepareOptions::default()
        })
        .unwrap();
        assert_eq!(summary.raw_rows, per_class * 3 + 1);
        assert_eq!(summary.dropped_rows, 1);
        assert_eq!(summary.classes, ["Adelie", "Chinstrap", "Gentoo"]);
        Self { _dir: dir, root }
    }

    fn processed(&self) -> std::path::PathBuf {
        self.root.join("processed")
    }

    fn models(&self) -> std::path::PathBuf {
        self.root.join("models")
    }

    fn form_paths(&self) -> FormPaths {
        FormPaths {
            processed_dir: self.processed(),
            models_dir: self.models(),
            images_dir: self.root.join("images"),
        }
    }
}

#[test]
fn prepared_partitions_train_a_usable_model() {
    let workspace = Workspace::prepared(30);
    let mut trainer = Trainer::from_dir(&workspace.processed()).unwrap();
    assert_eq!(
        trainer.partitions().x_train.len() + trainer.partitions().x_test.len(),
        90
    );

    let acc = trainer.fit(Objective::MultiSoftprob, 42).unwrap();
    assert!(acc >= 0.9, "accuracy {acc}");
    assert!(trainer.accuracy(EvalSplit::Train).unwrap() >= 0.9);

    let figure = workspace.root.join("figures").join(LOSS_PLOT_FILE);
    plot_loss_curves(trainer.evaluate().unwrap(), &figure).unwrap();
    assert!(figure.is_file());

    let written = trainer
        .save(&workspace.models().join("model.json"), true)
        .unwrap();
    let stem = written.file_stem().unwrap().to_string_lossy().to_string();
    assert!(stem.starts_with("model_acc_"), "{stem}");
    assert_eq!(list_models(&workspace.models()).unwrap(), vec![stem.clone()]);

    let artifact = ModelArtifact::load_json(&model_path(&workspace.models(), &stem)).unwrap();
    let mut memo = SessionMemo::new();
    let session = SessionId::new();
    let fields = memo
        .field_ranges(session, &workspace.processed())
        .unwrap()
        .to_vec();
    let encoder = memo.label_space(session, &workspace.processed()).unwrap();
    let values: Vec<f64> = centre("Gentoo")
        .iter()
        .zip(&fields)
        .map(|(value, field)| field.range.clamp(*value))
        .collect();
    let prediction = predict_one(&artifact, encoder, &fields, &values).unwrap();
    assert_eq!(prediction.label, "Gentoo");
    assert_eq!(prediction.headline(), "GENTOO");
    assert_eq!(prediction.image_name(), "gentoo.png");
}

#[test]
fn form_predicts_with_the_selected_model() {
    let workspace = Workspace::prepared(30);
    let mut trainer = Trainer::from_dir(&workspace.processed()).unwrap();
    trainer.fit(Objective::MultiSoftmax, 7).unwrap();
    trainer
        .save(&workspace.models().join("softmax.json"), false)
        .unwrap();

    let mut app = FormApp::new(workspace.form_paths());
    assert_eq!(app.models(), ["softmax".to_string()]);
    assert_eq!(app.selected_model(), Some("softmax"));

    let fields = app.fields().unwrap();
    assert_eq!(fields.len(), 4);
    for (field, value) in fields.iter().zip(app.values()) {
        assert_eq!(*value, field.range.min);
        assert!(field.range.min < field.range.max);
        assert!(field.range.step > 0.0);
    }

    for (index, value) in centre("Adelie").into_iter().enumerate() {
        app.set_value(index, value).unwrap();
    }
    let prediction = app.submit().unwrap().clone();
    assert_eq!(prediction.label, "Adelie");
    assert_eq!(app.status(), None);
}

#[test]
fn form_without_models_reports_status() {
    let workspace = Workspace::prepared(10);
    let mut app = FormApp::new(workspace.form_paths());
    assert!(app.models().is_empty());
    assert!(app.status().is_some());
    assert!(app.submit().is_err());
}

#[test]
fn binary_objective_rejects_three_species() {
    let workspace = Workspace::prepared(10);
    let mut trainer = Trainer::from_dir(&workspace.processed()).unwrap();
    let err = trainer.fit(Objective::BinaryLogistic, 42).unwrap_err();
    assert!(matches!(
        err,
        TrainError::ObjectiveMismatch { n_classes: 3, .. }
    ));
}

#[test]
fn loading_a_model_rescores_it() {
    let workspace = Workspace::prepared(20);
    let mut trainer = Trainer::from_dir(&workspace.processed()).unwrap();
    let fitted = trainer.fit(Objective::MultiSoftprob, 42).unwrap();
    let path = trainer
        .save(&workspace.models().join("model.json"), false)
        .unwrap();

    let mut fresh = Trainer::from_dir(&workspace.processed()).unwrap();
    let loaded = fresh.load(&path).unwrap();
    assert_eq!(loaded, fitted);
    assert!(matches!(fresh.evaluate(), Err(TrainError::NotFitted)));
}
