//! Per-frame orchestration from network output to joint temperatures.
//!
//! Each frame is processed independently: keypoints are extracted from the
//! heatmaps, grouped into skeletons with the affinity fields, the most
//! centered skeleton is selected and its joints are sampled in the registered
//! depth frame. No state carries over between frames.

use crate::config::Config;
use crate::frame::{DepthFrame, FrameMetadata, FramePair, FrameSource};
use crate::grouping::PoseAssembler;
use crate::inference::{NetworkOutput, PoseNetwork};
use crate::keypoints::KeypointExtractor;
use crate::selection::PoseSelector;
use crate::skeleton::Skeleton;
use crate::temperature::{TemperatureReading, TemperatureSampler};
use crate::topology::Topology;
use crate::{Error, Result};
use log::{debug, info};
use serde::Serialize;
use std::time::Instant;

/// Result of processing one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameEstimate {
    /// Every skeleton that passed validation, in assembly order
    pub skeletons: Vec<Skeleton>,
    /// Index of the selected skeleton in `skeletons`
    pub selected: Option<usize>,
    /// Readings for the selected skeleton's joints
    pub temperatures: TemperatureReading,
}

impl FrameEstimate {
    /// The selected skeleton, if any
    #[must_use]
    pub fn selected_skeleton(&self) -> Option<&Skeleton> {
        self.selected.and_then(|idx| self.skeletons.get(idx))
    }
}

/// Keypoint extraction, pose assembly, selection and sampling for a session
#[derive(Debug, Clone)]
pub struct JointTemperaturePipeline {
    topology: Topology,
    extractor: KeypointExtractor,
    assembler: PoseAssembler,
    selector: PoseSelector,
    sampler: TemperatureSampler,
    metadata: FrameMetadata,
}

impl JointTemperaturePipeline {
    /// Build a pipeline for frames described by `metadata`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration does not validate
    pub fn new(config: &Config, metadata: FrameMetadata) -> Result<Self> {
        config.validate()?;
        if metadata.width == 0 || metadata.height == 0 {
            return Err(Error::ConfigError(format!(
                "Frame size {}x{} is empty",
                metadata.width, metadata.height
            )));
        }

        Ok(Self {
            topology: config.topology.clone(),
            extractor: KeypointExtractor::new(&config.extraction),
            assembler: PoseAssembler::new(&config.grouping, &config.topology),
            selector: PoseSelector::new(&config.selection),
            sampler: TemperatureSampler::new(&config.sampling, metadata.depth_scale),
            metadata,
        })
    }

    /// Joint topology in use
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Session frame metadata
    #[must_use]
    pub fn metadata(&self) -> FrameMetadata {
        self.metadata
    }

    /// Skeletons in frame pixel space from one network output
    ///
    /// # Errors
    ///
    /// Returns `ModelDataFormatError` for malformed stacks, or an error if a
    /// joint cannot be mapped onto the frame
    pub fn estimate_skeletons(&self, output: &NetworkOutput) -> Result<Vec<Skeleton>> {
        output.validate(&self.topology)?;

        let candidates = self
            .extractor
            .extract_all(output.heatmaps.view(), self.topology.num_joints());
        let groups = self.assembler.assemble(&candidates, output.fields.view());

        groups
            .iter()
            .map(|group| Skeleton::from_group(group, &candidates, &output.transform))
            .collect()
    }

    /// Skeletons, selection and readings for one frame
    ///
    /// # Errors
    ///
    /// Returns an error if the network output is malformed or the depth frame
    /// does not match the session frame size
    pub fn estimate(&self, output: &NetworkOutput, depth: &DepthFrame) -> Result<FrameEstimate> {
        let (height, width) = depth.dim();
        if (width, height) != (self.metadata.width as usize, self.metadata.height as usize) {
            return Err(Error::InvalidInput(format!(
                "Depth frame is {width}x{height}, expected {}x{}",
                self.metadata.width, self.metadata.height
            )));
        }

        let skeletons = self.estimate_skeletons(output)?;
        let selected = self.selector.select_index(&skeletons, self.metadata.width);
        let temperatures = self
            .sampler
            .sample(selected.map(|idx| &skeletons[idx]), depth, &self.topology);

        debug!(
            "{} skeleton(s), selected {:?}, {} joint reading(s)",
            skeletons.len(),
            selected,
            temperatures.len()
        );

        Ok(FrameEstimate {
            skeletons,
            selected,
            temperatures,
        })
    }

    /// Run the network on a frame pair and estimate it
    ///
    /// # Errors
    ///
    /// Returns any inference or estimation error
    pub fn process_frame<N: PoseNetwork + ?Sized>(&self, network: &mut N, frame: &FramePair) -> Result<FrameEstimate> {
        let output = network.infer(&frame.color)?;
        self.estimate(&output, &frame.depth)
    }

    /// Process frames until the source is exhausted or `max_frames` is reached
    ///
    /// `on_frame` receives the frame index and its estimate. Acquisition and
    /// inference errors abort the run.
    ///
    /// # Errors
    ///
    /// Returns the first error from the source, the network, estimation or
    /// `on_frame`
    pub fn run<S, N, F>(&self, source: &mut S, network: &mut N, max_frames: Option<usize>, mut on_frame: F) -> Result<usize>
    where
        S: FrameSource + ?Sized,
        N: PoseNetwork + ?Sized,
        F: FnMut(usize, &FrameEstimate) -> Result<()>,
    {
        info!("Starting frame loop");
        let start = Instant::now();
        let mut processed = 0;

        while max_frames.map_or(true, |max| processed < max) {
            let Some(frame) = source.next_frame()? else {
                info!("Frame source exhausted");
                break;
            };

            let estimate = self.process_frame(network, &frame)?;
            on_frame(processed, &estimate)?;
            processed += 1;
        }

        let elapsed = start.elapsed().as_secs_f64();
        if processed > 0 && elapsed > 0.0 {
            #[allow(clippy::cast_precision_loss)] // Frame counts are small
            let fps = processed as f64 / elapsed;
            info!("Processed {} frame(s) at {:.1} FPS", processed, fps);
        }

        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::FieldTransform;
    use ndarray::{Array2, Array3};

    fn metadata() -> FrameMetadata {
        FrameMetadata {
            width: 64,
            height: 48,
            depth_scale: 0.001,
        }
    }

    fn empty_output() -> NetworkOutput {
        NetworkOutput {
            heatmaps: Array3::zeros((19, 48, 64)),
            fields: Array3::zeros((38, 48, 64)),
            transform: FieldTransform::identity(),
        }
    }

    struct FixedNetwork {
        calls: usize,
    }

    impl PoseNetwork for FixedNetwork {
        fn infer(&mut self, _color: &crate::frame::ColorFrame) -> Result<NetworkOutput> {
            self.calls += 1;
            Ok(empty_output())
        }
    }

    struct CountingSource {
        remaining: usize,
    }

    impl FrameSource for CountingSource {
        fn metadata(&self) -> FrameMetadata {
            metadata()
        }

        fn next_frame(&mut self) -> Result<Option<FramePair>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            FramePair::new(Array3::zeros((48, 64, 3)), Array2::zeros((48, 64))).map(Some)
        }
    }

    #[test]
    fn test_empty_frame_has_no_selection() {
        let pipeline = JointTemperaturePipeline::new(&Config::default(), metadata()).unwrap();
        let estimate = pipeline.estimate(&empty_output(), &Array2::zeros((48, 64))).unwrap();
        assert!(estimate.skeletons.is_empty());
        assert_eq!(estimate.selected, None);
        assert!(estimate.selected_skeleton().is_none());
        assert!(estimate.temperatures.is_empty());
    }

    #[test]
    fn test_depth_size_mismatch_rejected() {
        let pipeline = JointTemperaturePipeline::new(&Config::default(), metadata()).unwrap();
        let result = pipeline.estimate(&empty_output(), &Array2::zeros((10, 10)));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_empty_metadata_rejected() {
        let metadata = FrameMetadata {
            width: 0,
            height: 48,
            depth_scale: 0.001,
        };
        assert!(JointTemperaturePipeline::new(&Config::default(), metadata).is_err());
    }

    #[test]
    fn test_run_stops_when_source_exhausted() {
        let pipeline = JointTemperaturePipeline::new(&Config::default(), metadata()).unwrap();
        let mut source = CountingSource { remaining: 3 };
        let mut network = FixedNetwork { calls: 0 };
        let mut seen = Vec::new();

        let processed = pipeline
            .run(&mut source, &mut network, None, |idx, _| {
                seen.push(idx);
                Ok(())
            })
            .unwrap();

        assert_eq!(processed, 3);
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(network.calls, 3);
    }

    #[test]
    fn test_run_honours_max_frames() {
        let pipeline = JointTemperaturePipeline::new(&Config::default(), metadata()).unwrap();
        let mut source = CountingSource { remaining: 10 };
        let mut network = FixedNetwork { calls: 0 };

        let processed = pipeline.run(&mut source, &mut network, Some(2), |_, _| Ok(())).unwrap();
        assert_eq!(processed, 2);
        assert_eq!(source.remaining, 8);
    }
}
