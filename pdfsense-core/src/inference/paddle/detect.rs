use std::path::Path;

use glam::Vec2;
use image::{DynamicImage, GrayImage, Luma, imageops::FilterType};
use imageproc::{
    contours::{BorderType, find_contours},
    contrast::{ThresholdType, threshold},
    distance_transform::Norm,
    morphology::dilate,
};
use ndarray::prelude::*;
use ort::{
    session::{Session, builder::SessionBuilder},
    value::TensorRef,
};
use snafu::{OptionExt, ResultExt};

use crate::{
    analysis::bbox::Bbox,
    consts::PADDLE_DET_INPUT_SIZE,
    error::*,
    inference::model::{Model, OnnxSession, read_weights},
};

pub type PaddleDetInput = Array4<f32>;
pub type PaddleDetOutput = Array2<f32>;

/// Configuration for the DB text detection model.
#[derive(Debug, Clone)]
pub struct PaddleDetConfig {
    /// Square side the page is fitted into before inference
    pub input_size: usize,
    /// Value of the padding outside the fitted page, in normalized space
    pub background_fill_value: f32,
    /// Probability above which a pixel counts as text
    pub det_db_thresh: f32,
    /// Mean probability a candidate box needs to be kept
    pub det_db_box_thresh: f32,
    /// Grows each box by `area * ratio / perimeter`
    pub det_db_unclip_ratio: f32,
    /// Boxes whose short side is below this are noise
    pub min_side: f32,
    pub max_candidates: usize,
}

impl Default for PaddleDetConfig {
    fn default() -> Self {
        Self {
            input_size: PADDLE_DET_INPUT_SIZE,
            background_fill_value: 0.5,
            det_db_thresh: 0.3,
            det_db_box_thresh: 0.6,
            det_db_unclip_ratio: 1.5,
            min_side: 3.0,
            max_candidates: 1000,
        }
    }
}

pub struct PaddleDet {
    weights: Vec<u8>,
    config: PaddleDetConfig,
}

impl PaddleDet {
    pub fn from_file(path: impl AsRef<Path>, config: PaddleDetConfig) -> Result<Self, PdfsenseError> {
        Ok(Self {
            weights: read_weights(path)?,
            config,
        })
    }
}

impl Model for PaddleDet {
    type Input = PaddleDetInput;
    type Output = PaddleDetOutput;
    type Config = PaddleDetConfig;

    const INPUT_NAME: &'static str = "x";
    const OUTPUT_NAME: &'static str = "fetch_name_0";
    const MODEL_NAME: &'static str = "PP-OCRv5_mobile_det";

    fn load(&self) -> &[u8] {
        &self.weights
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

/// Text line found on a page, in page image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDetection {
    pub bbox: Bbox,
    pub proba: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct DetExtra {
    /// Page image dimensions
    pub original_shape: (u32, u32),
    /// Dimensions of the page inside the model input
    pub resized_shape: (u32, u32),
}

impl DetExtra {
    pub fn fit(image: &DynamicImage, input_size: usize) -> Self {
        let (orig_w, orig_h) = (image.width().max(1), image.height().max(1));
        let scale = f32::min(
            input_size as f32 / orig_w as f32,
            input_size as f32 / orig_h as f32,
        );
        Self {
            original_shape: (orig_w, orig_h),
            resized_shape: (
                ((orig_w as f32 * scale) as u32).max(1),
                ((orig_h as f32 * scale) as u32).max(1),
            ),
        }
    }

    fn to_original(&self) -> Vec2 {
        Vec2::new(
            self.original_shape.0 as f32 / self.resized_shape.0 as f32,
            self.original_shape.1 as f32 / self.resized_shape.1 as f32,
        )
    }
}

pub struct PaddleDetSession<M: Model> {
    session: Session,
    model: M,
}

impl PaddleDetSession<PaddleDet> {
    pub fn new(session: SessionBuilder, model: PaddleDet) -> Result<Self, PdfsenseError> {
        let session = session
            .commit_from_memory(model.load())
            .context(OrtInitSnafu { stage: "commit" })?;

        Ok(Self { session, model })
    }

    /// Detect text lines in an entire page image
    pub fn detect_text_lines(
        &mut self,
        image: &DynamicImage,
    ) -> Result<Vec<TextDetection>, PdfsenseError> {
        let extra = DetExtra::fit(image, self.model.config().input_size);
        self.run(image, extra)
    }
}

impl OnnxSession<PaddleDet> for PaddleDetSession<PaddleDet> {
    type Output = Vec<TextDetection>;
    type Extra = DetExtra;

    fn preprocess(&self, image: &DynamicImage) -> Result<PaddleDetInput, PdfsenseError> {
        let config = self.model.config();
        let extra = DetExtra::fit(image, config.input_size);
        let (new_w, new_h) = extra.resized_shape;

        let resized = image::imageops::resize(&image.to_rgb8(), new_w, new_h, FilterType::Triangle);

        let mut input_tensor = Array4::from_elem(
            [1, 3, config.input_size, config.input_size],
            config.background_fill_value,
        );
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for (channel, value) in pixel.0.iter().enumerate() {
                input_tensor[[0, channel, y, x]] = (*value as f32 / 255.0 - 0.5) / 0.5;
            }
        }

        Ok(input_tensor)
    }

    fn postprocess(
        &self,
        output: PaddleDetOutput,
        extra: Self::Extra,
    ) -> Result<Self::Output, PdfsenseError> {
        Ok(db_postprocess(output.view(), self.model.config(), &extra))
    }

    fn infer(
        &mut self,
        input: PaddleDetInput,
        input_name: &str,
        output_name: &str,
    ) -> Result<PaddleDetOutput, PdfsenseError> {
        let output = self
            .session
            .run(ort::inputs![
                input_name => TensorRef::from_array_view(&input).context(TensorSnafu { stage: "detect-input" })?
            ])
            .context(InferenceSnafu {})?;

        let tensor = output
            .get(output_name)
            .context(NotFoundOutputSnafu { output_name })?
            .try_extract_array::<f32>()
            .context(TensorSnafu {
                stage: "detect-extract",
            })?;

        // [batch, 1, h, w] probability map
        let shape = tensor.shape();
        if shape.len() < 2 {
            return Err(PdfsenseError::Capability {
                capability: "ocr".to_string(),
                message: format!("unexpected detection output shape {:?}", shape),
            });
        }
        let (h, w) = (shape[shape.len() - 2], shape[shape.len() - 1]);
        let probability = tensor
            .to_shape((h, w))
            .context(ShapeSnafu { stage: "detect" })?
            .to_owned();

        Ok(probability)
    }
}

/// Differentiable-binarization post processing over a `[h, w]` probability map.
///
/// Boxes are axis aligned and returned in page image coordinates.
pub fn db_postprocess(
    probability: ArrayView2<f32>,
    config: &PaddleDetConfig,
    extra: &DetExtra,
) -> Vec<TextDetection> {
    let (h, w) = probability.dim();
    if h == 0 || w == 0 {
        return Vec::new();
    }

    let gray = GrayImage::from_fn(w as u32, h as u32, |x, y| {
        Luma([(probability[[y as usize, x as usize]].clamp(0.0, 1.0) * 255.0) as u8])
    });
    let binary = threshold(
        &gray,
        (config.det_db_thresh * 255.0) as u8,
        ThresholdType::Binary,
    );
    let dilated = dilate(&binary, Norm::LInf, 1);

    let limit = Vec2::new(
        extra.original_shape.0 as f32,
        extra.original_shape.1 as f32,
    );
    let to_original = extra.to_original();

    find_contours::<i32>(&dilated)
        .into_iter()
        .filter(|contour| matches!(contour.border_type, BorderType::Outer))
        .take(config.max_candidates)
        .filter_map(|contour| {
            let points = contour
                .points
                .iter()
                .map(|point| Vec2::new(point.x as f32, point.y as f32));
            let bbox = Bbox::enclosing(points)?;
            // pixel centers to pixel edges
            let bbox = Bbox::new(bbox.min, bbox.max + Vec2::ONE);
            if bbox.width().min(bbox.height()) < config.min_side {
                return None;
            }

            let proba = mean_probability(&probability, &bbox);
            if proba < config.det_db_box_thresh {
                return None;
            }

            let distance = bbox.area() * config.det_db_unclip_ratio / bbox.perimeter();
            let bbox = bbox.expand(distance);
            if bbox.width().min(bbox.height()) < config.min_side + 2.0 {
                return None;
            }

            let bbox = bbox.scale_xy(to_original).clamp(Vec2::ZERO, limit);
            Some(TextDetection { bbox, proba })
        })
        .collect()
}

fn mean_probability(probability: &ArrayView2<f32>, bbox: &Bbox) -> f32 {
    let (h, w) = probability.dim();
    let x0 = (bbox.min.x.max(0.0) as usize).min(w);
    let y0 = (bbox.min.y.max(0.0) as usize).min(h);
    let x1 = (bbox.max.x.max(0.0) as usize).min(w);
    let y1 = (bbox.max.y.max(0.0) as usize).min(h);
    if x0 >= x1 || y0 >= y1 {
        return 0.0;
    }

    probability.slice(s![y0..y1, x0..x1]).mean().unwrap_or(0.0)
}
