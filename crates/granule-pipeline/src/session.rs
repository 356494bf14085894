//! Interactive analysis session.
//!
//! A [`Session`] owns everything the operator works on: the loaded image,
//! an optional crop of it, the current mask, the extracted particles and
//! the filter result. Operations run in any order the operator chooses;
//! each one either succeeds and updates the state, or fails and leaves
//! the session exactly as it was.
//!
//! Downstream results never go stale. Loading, cropping or changing the
//! threshold recomputes the mask and discards the particle list and the
//! filter result, which must then be recomputed with [`Session::analyze`]
//! and [`Session::apply_filter`].

use image::{DynamicImage, RgbImage};

use crate::annotate::annotate;
use crate::binarize::{Binarization, binarize};
use crate::crop::{CropEditor, PixelRect, crop_image};
use crate::filter::{FilterResult, filter_particles, parse_min_area, render_filtered};
use crate::grayscale::{decode, to_rgb};
use crate::particle::{Extraction, Particle, extract_particles};
use crate::types::{AnalysisConfig, Dimensions, PipelineError};

/// Particles traced from the current mask, plus their overlay.
#[derive(Debug, Clone)]
struct Analysis {
    extraction: Extraction,
    annotated: RgbImage,
}

/// Filter outcome, plus its overlay.
#[derive(Debug, Clone)]
struct Filtering {
    result: FilterResult,
    rendered: RgbImage,
}

/// Loaded image and everything derived from it.
#[derive(Debug, Clone)]
struct Loaded {
    name: String,
    original: DynamicImage,
    cropped: Option<DynamicImage>,
    binarization: Binarization,
    analysis: Option<Analysis>,
    filtering: Option<Filtering>,
}

impl Loaded {
    /// The image analysis runs on: the crop if there is one.
    fn working(&self) -> &DynamicImage {
        self.cropped.as_ref().unwrap_or(&self.original)
    }
}

/// Operator session state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: AnalysisConfig,
    loaded: Option<Loaded>,
}

impl Session {
    /// Empty session using `config` for threshold and simplification.
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            loaded: None,
        }
    }

    /// Current parameters. `min_area` is the last cutoff applied.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Current binarization threshold.
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.config.threshold
    }

    /// Decode `bytes` and load the result.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] or
    /// [`PipelineError::ImageDecode`] if the bytes are not an image.
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        let image = decode(bytes)?;
        self.load_image(name, image);
        Ok(())
    }

    /// Replace the session's image. Any crop, particle list and filter
    /// result from the previous image is discarded.
    pub fn load_image(&mut self, name: &str, image: DynamicImage) {
        tracing::info!(
            name,
            width = image.width(),
            height = image.height(),
            "loaded image"
        );
        let binarization = binarize(&image, self.config.threshold);
        self.loaded = Some(Loaded {
            name: name.to_string(),
            original: image,
            cropped: None,
            binarization,
            analysis: None,
            filtering: None,
        });
    }

    /// Name the current image was loaded under.
    #[must_use]
    pub fn source_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.name.as_str())
    }

    /// The image as loaded.
    #[must_use]
    pub fn original(&self) -> Option<&DynamicImage> {
        self.loaded.as_ref().map(|l| &l.original)
    }

    /// The crop applied to the original, if any.
    #[must_use]
    pub fn cropped(&self) -> Option<&DynamicImage> {
        self.loaded.as_ref().and_then(|l| l.cropped.as_ref())
    }

    /// Grayscale and mask of the working image.
    #[must_use]
    pub fn binarization(&self) -> Option<&Binarization> {
        self.loaded.as_ref().map(|l| &l.binarization)
    }

    /// Set the threshold and recompute the mask.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoImage`] if nothing is loaded; the
    /// threshold is not changed in that case.
    pub fn set_threshold(&mut self, threshold: u8) -> Result<&Binarization, PipelineError> {
        let loaded = self.loaded.as_mut().ok_or(PipelineError::NoImage)?;
        self.config.threshold = threshold;
        loaded.binarization = binarize(loaded.working(), threshold);
        loaded.analysis = None;
        loaded.filtering = None;
        Ok(&loaded.binarization)
    }

    /// Crop editor over a preview of the original image fitted to `widget`.
    ///
    /// Cropping always starts from the original, so a new crop replaces
    /// rather than narrows the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoImage`] if nothing is loaded and
    /// [`PipelineError::PreviewTooSmall`] if the preview cannot hold a
    /// minimum-size rectangle.
    pub fn crop_editor(&self, widget: Dimensions) -> Result<(CropEditor, RgbImage), PipelineError> {
        let loaded = self.loaded.as_ref().ok_or(PipelineError::NoImage)?;
        CropEditor::for_image(&to_rgb(&loaded.original), widget)
    }

    /// Commit `editor`'s rectangle against the original and make the
    /// cropped region the working image.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoImage`] if nothing is loaded, or the
    /// error from [`CropEditor::commit`].
    pub fn apply_crop(&mut self, editor: &CropEditor) -> Result<PixelRect, PipelineError> {
        let loaded = self.loaded.as_mut().ok_or(PipelineError::NoImage)?;
        let rect = editor.commit(Dimensions::of(&loaded.original))?;
        let cropped = crop_image(&loaded.original, rect);
        tracing::info!(
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "applied crop"
        );
        loaded.binarization = binarize(&cropped, self.config.threshold);
        loaded.cropped = Some(cropped);
        loaded.analysis = None;
        loaded.filtering = None;
        Ok(rect)
    }

    /// Trace and measure the particles in the current mask.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoImage`] if nothing is loaded.
    pub fn analyze(&mut self) -> Result<&[Particle], PipelineError> {
        let loaded = self.loaded.as_mut().ok_or(PipelineError::NoImage)?;
        let extraction =
            extract_particles(&loaded.binarization.mask, self.config.simplify_tolerance);
        let annotated = annotate(&to_rgb(loaded.working()), &extraction.particles);
        loaded.filtering = None;
        let analysis = loaded.analysis.insert(Analysis {
            extraction,
            annotated,
        });
        Ok(&analysis.extraction.particles)
    }

    /// Particles from the last [`analyze`](Self::analyze), if still current.
    #[must_use]
    pub fn extraction(&self) -> Option<&Extraction> {
        self.analysis().map(|a| &a.extraction)
    }

    /// Overlay of every extracted particle.
    #[must_use]
    pub fn annotated(&self) -> Option<&RgbImage> {
        self.analysis().map(|a| &a.annotated)
    }

    /// Parse `min_area` text and keep the particles at least that large.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidMinArea`] for input that is not a
    /// non-negative number, [`PipelineError::NoImage`] if nothing is
    /// loaded and [`PipelineError::NotAnalyzed`] if there is no current
    /// particle list.
    pub fn apply_filter(&mut self, min_area: &str) -> Result<&FilterResult, PipelineError> {
        let min_area = parse_min_area(min_area)?;
        let loaded = self.loaded.as_mut().ok_or(PipelineError::NoImage)?;
        let analysis = loaded.analysis.as_ref().ok_or(PipelineError::NotAnalyzed)?;
        let result = filter_particles(&analysis.extraction.particles, min_area);
        let rendered = render_filtered(&to_rgb(loaded.working()), &result);
        self.config.min_area = min_area;
        let filtering = loaded.filtering.insert(Filtering { result, rendered });
        Ok(&filtering.result)
    }

    /// Outcome of the last [`apply_filter`](Self::apply_filter), if still
    /// current.
    #[must_use]
    pub fn filter_result(&self) -> Option<&FilterResult> {
        self.loaded
            .as_ref()
            .and_then(|l| l.filtering.as_ref())
            .map(|f| &f.result)
    }

    /// The image to export: the filtered overlay if a filter has been
    /// applied, otherwise the overlay of every particle.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NothingToExport`] before
    /// [`analyze`](Self::analyze).
    pub fn processed_image(&self) -> Result<&RgbImage, PipelineError> {
        let loaded = self.loaded.as_ref().ok_or(PipelineError::NothingToExport)?;
        loaded
            .filtering
            .as_ref()
            .map(|f| &f.rendered)
            .or_else(|| loaded.analysis.as_ref().map(|a| &a.annotated))
            .ok_or(PipelineError::NothingToExport)
    }

    /// The particle rows to export.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NothingToExport`] until a filter has been
    /// applied to a current particle list.
    pub fn export_particles(&self) -> Result<&[Particle], PipelineError> {
        self.filter_result()
            .map(|f| f.particles.as_slice())
            .ok_or(PipelineError::NothingToExport)
    }

    fn analysis(&self) -> Option<&Analysis> {
        self.loaded.as_ref().and_then(|l| l.analysis.as_ref())
    }
}
