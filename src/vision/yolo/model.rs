// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 ONNX detection model
//!
//! Loads an Ultralytics YOLOv8 export through ONNX Runtime and implements
//! [`ObjectDetector`] on top of it.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{Array4, ArrayD};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::postprocess::{check_output_shape, decode_output, non_max_suppression, Thresholds};
use super::preprocessing::preprocess;
use crate::config::DetectorConfig;
use crate::vision::detector::{ObjectDetector, RawDetection};
use crate::vision::labels::ClassLabels;

/// Metadata key under which Ultralytics stores the class table
const NAMES_METADATA_KEY: &str = "names";

/// YOLOv8 detector backed by an ONNX Runtime session
#[derive(Clone)]
pub struct YoloDetector {
    /// ONNX Runtime session; `run` needs exclusive access
    session: Arc<Mutex<Session>>,
    input_name: String,
    input_size: u32,
    thresholds: Thresholds,
    labels: ClassLabels,
    model_name: String,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("model_name", &self.model_name)
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .field("thresholds", &self.thresholds)
            .field("classes", &self.labels.len())
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load the detector described by `config`
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime cannot load the model
    /// - No class table is available (neither `labels_path` nor model metadata)
    /// - The class table size does not match the model's output head
    pub async fn new(config: &DetectorConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();

        if !model_path.exists() {
            anyhow::bail!("Detection model not found: {}", model_path.display());
        }

        info!("Loading detection model from {}", model_path.display());

        let mut session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("Failed to load detection model from {}", model_path.display())
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let labels = match &config.labels_path {
            Some(path) => ClassLabels::from_file(path)?,
            None => Self::labels_from_metadata(&session)?,
        };

        Self::check_label_count(&mut session, &input_name, config.input_size, labels.len())?;

        let model_name = model_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "yolov8".to_string());

        info!(
            "✅ Detection model '{}' loaded: {} classes, input {}x{} (CPU)",
            model_name,
            labels.len(),
            config.input_size,
            config.input_size
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            input_size: config.input_size,
            thresholds: Thresholds {
                confidence: config.confidence_threshold,
                iou: config.iou_threshold,
                max_detections: config.max_detections,
            },
            labels,
            model_name,
        })
    }

    fn labels_from_metadata(session: &Session) -> Result<ClassLabels> {
        let raw = session
            .metadata()
            .ok()
            .and_then(|metadata| metadata.custom(NAMES_METADATA_KEY).ok().flatten());

        match raw {
            Some(raw) => ClassLabels::from_metadata(&raw),
            None => {
                warn!("Model has no '{}' metadata entry", NAMES_METADATA_KEY);
                anyhow::bail!(
                    "No class names available: set a labels file or export the model with names metadata"
                )
            }
        }
    }

    /// Run one blank frame and compare the head's channel count with the
    /// class table
    fn check_label_count(
        session: &mut Session,
        input_name: &str,
        input_size: u32,
        num_classes: usize,
    ) -> Result<()> {
        let size = input_size as usize;
        let blank = Array4::<f32>::zeros((1, 3, size, size));
        let output = run_session(session, input_name, blank)
            .context("Warm-up inference failed")?;

        check_output_shape(output.shape(), num_classes)
            .context("Class labels do not fit the detection model")?;

        debug!("Detection head shape {:?} matches {} classes", output.shape(), num_classes);
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<RawDetection>> {
        let started = Instant::now();
        let (input, letterbox) = preprocess(image, self.input_size);

        let output = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

            run_session(&mut session, &self.input_name, input)?
        };

        debug!("Detection output shape: {:?}", output.shape());

        let candidates = decode_output(
            output.view(),
            self.labels.len(),
            self.thresholds.confidence,
        )?;
        let kept = non_max_suppression(
            candidates,
            self.thresholds.iou,
            self.thresholds.max_detections,
        );

        let detections: Vec<RawDetection> = kept
            .into_iter()
            .map(|c| RawDetection {
                bbox: letterbox.map_box(c.bbox),
                confidence: c.confidence,
                class_id: c.class_id,
            })
            .collect();

        debug!(
            "Detected {} objects in {}ms",
            detections.len(),
            started.elapsed().as_millis()
        );

        Ok(detections)
    }

    fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// Single forward pass, returning an owned copy of the first output
fn run_session(session: &mut Session, input_name: &str, input: Array4<f32>) -> Result<ArrayD<f32>> {
    let input_value = Value::from_array(input).context("Failed to create input tensor")?;

    let outputs = session
        .run(ort::inputs![input_name => input_value])
        .context("Detection inference failed")?;

    let output = outputs[0]
        .try_extract_array::<f32>()
        .context("Failed to extract output tensor")?
        .to_owned();

    Ok(output)
}
