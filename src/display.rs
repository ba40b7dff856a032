use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};

use crate::frame::Frame;

/// Where frames and decoded text end up.
pub(crate) trait Display {
    fn render(&mut self, frame: &Frame);
    fn set_label(&mut self, text: &str);
}

/// Keeps the latest frame as an egui texture along with the label text.
pub(crate) struct EguiDisplay {
    ctx: egui::Context,
    texture: Option<TextureHandle>,
    label: String,
}

impl EguiDisplay {
    pub(crate) fn new(ctx: egui::Context, label: impl Into<String>) -> Self {
        Self {
            ctx,
            texture: None,
            label: label.into(),
        }
    }

    pub(crate) fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }
}

impl Display for EguiDisplay {
    fn render(&mut self, frame: &Frame) {
        let image = ColorImage::from_rgb(
            [frame.width() as usize, frame.height() as usize],
            frame.as_rgb().as_raw(),
        );

        match self.texture.as_mut() {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(self.ctx.load_texture(
                    "camera_frame",
                    image,
                    TextureOptions::LINEAR,
                ));
            }
        }
    }

    fn set_label(&mut self, text: &str) {
        self.label = text.to_string();
        // The label strip sizes itself to the text on the next frame.
        self.ctx.request_repaint();
    }
}
