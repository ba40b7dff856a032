use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    Camera,
};

use crate::frame::Frame;

/// The camera could not produce a frame.
///
/// Every failure of the frame source is an unavailability of the device:
/// it never opened, a single read failed, or it has already been released.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DeviceUnavailable {
    #[error("could not open camera {index}: {message}")]
    Open { index: u32, message: String },
    #[error("could not read frame: {0}")]
    Read(String),
    #[error("camera has been released")]
    Released,
}

/// Something that produces camera frames on demand.
pub(crate) trait FrameSource {
    fn read(&mut self) -> Result<Frame, DeviceUnavailable>;

    /// Gives up the underlying device. Calling this more than once is a no-op.
    fn release(&mut self);

    fn is_open(&self) -> bool;
}

/// Requested capture format. The camera is free to pick the closest mode it
/// supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolutionHint {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) frame_rate: u32,
}

impl Default for ResolutionHint {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate: 30,
        }
    }
}

pub(crate) struct NokhwaCamera {
    index: u32,
    camera: Option<Camera>,
}

impl NokhwaCamera {
    #[tracing::instrument(skip(hint), fields(width = hint.width, height = hint.height))]
    pub(crate) fn open(index: u32, hint: ResolutionHint) -> Result<Self, DeviceUnavailable> {
        let open_err = move |err: nokhwa::NokhwaError| DeviceUnavailable::Open {
            index,
            message: err.to_string(),
        };

        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(hint.width, hint.height),
                FrameFormat::MJPEG,
                hint.frame_rate,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(index), format).map_err(open_err)?;
        camera.open_stream().map_err(open_err)?;

        let resolution = camera.resolution();
        tracing::info!(
            actual_width = resolution.width(),
            actual_height = resolution.height(),
            "opened camera"
        );

        Ok(Self {
            index,
            camera: Some(camera),
        })
    }
}

impl FrameSource for NokhwaCamera {
    fn read(&mut self) -> Result<Frame, DeviceUnavailable> {
        let camera = self.camera.as_mut().ok_or(DeviceUnavailable::Released)?;

        let buffer = camera
            .frame()
            .map_err(|err| DeviceUnavailable::Read(err.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|err| DeviceUnavailable::Read(err.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        Frame::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
            DeviceUnavailable::Read(format!("frame buffer does not match {width}x{height}"))
        })
    }

    fn release(&mut self) {
        let Some(mut camera) = self.camera.take() else {
            return;
        };

        if let Err(err) = camera.stop_stream() {
            tracing::warn!(index = self.index, "could not stop camera stream: {err}");
        }

        tracing::info!(index = self.index, "released camera");
    }

    fn is_open(&self) -> bool {
        self.camera.is_some()
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.release();
    }
}
