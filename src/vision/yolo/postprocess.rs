// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding and non-max suppression for YOLOv8 detection heads

use anyhow::Result;
use ndarray::{ArrayViewD, Ix3};
use std::cmp::Ordering;

/// A candidate box in model input space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// `[x1, y1, x2, y2]`
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: usize,
}

impl Candidate {
    pub fn area(&self) -> f32 {
        (self.bbox[2] - self.bbox[0]).max(0.0) * (self.bbox[3] - self.bbox[1]).max(0.0)
    }

    pub fn intersection(&self, other: &Candidate) -> f32 {
        let x1 = self.bbox[0].max(other.bbox[0]);
        let y1 = self.bbox[1].max(other.bbox[1]);
        let x2 = self.bbox[2].min(other.bbox[2]);
        let y2 = self.bbox[3].min(other.bbox[3]);
        (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
    }

    pub fn iou(&self, other: &Candidate) -> f32 {
        let intersection = self.intersection(other);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// Thresholds applied after the forward pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Minimum class score kept
    pub confidence: f32,
    /// Overlap above which the weaker same-class box is suppressed
    pub iou: f32,
    /// Upper bound on boxes returned per image
    pub max_detections: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            confidence: 0.25,
            iou: 0.7,
            max_detections: 300,
        }
    }
}

/// Check that a detection head carries `4 + num_classes` channels
///
/// Accepts `[1, 4 + nc, N]` or `[1, N, 4 + nc]`.
pub fn check_output_shape(shape: &[usize], num_classes: usize) -> Result<()> {
    if shape.len() != 3 {
        anyhow::bail!("Unexpected detection output shape: {:?}", shape);
    }

    let channels = 4 + num_classes;
    if shape[1] != channels && shape[2] != channels {
        anyhow::bail!(
            "Detection output shape {:?} does not match {} classes",
            shape,
            num_classes
        );
    }

    Ok(())
}

/// Decode a YOLOv8 head into candidates above the confidence threshold
///
/// The head is `[1, 4 + nc, N]` as exported by Ultralytics, or the
/// transposed `[1, N, 4 + nc]`. Each row is `cx, cy, w, h` followed by one
/// score per class.
pub fn decode_output(
    output: ArrayViewD<f32>,
    num_classes: usize,
    confidence_threshold: f32,
) -> Result<Vec<Candidate>> {
    let shape = output.shape().to_vec();
    check_output_shape(&shape, num_classes)?;

    let output = output
        .into_dimensionality::<Ix3>()
        .map_err(|_| anyhow::anyhow!("Unexpected detection output shape: {:?}", shape))?;

    let predictions = if shape[1] == 4 + num_classes {
        output.index_axis_move(ndarray::Axis(0), 0)
    } else {
        output.index_axis_move(ndarray::Axis(0), 0).reversed_axes()
    };

    // predictions is [channels, N]
    let mut candidates = Vec::new();
    for column in predictions.columns() {
        let (class_id, confidence) = column
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .fold((0usize, f32::MIN), |best, (i, score)| {
                if score > best.1 {
                    (i, score)
                } else {
                    best
                }
            });

        if confidence < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (column[0], column[1], column[2], column[3]);
        candidates.push(Candidate {
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            confidence: confidence.clamp(0.0, 1.0),
            class_id,
        });
    }

    Ok(candidates)
}

/// Per-class non-max suppression
///
/// Returns at most `max_detections` boxes ordered by descending confidence.
pub fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }

        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);

        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}
