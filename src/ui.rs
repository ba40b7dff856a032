use std::time::Instant;

use eframe::{
    egui::{
        self, load::SizedTexture, Button, CentralPanel, Color32, Key, RichText, TopBottomPanel,
        ViewportBuilder, ViewportCommand,
    },
    run_native, App, NativeOptions,
};
use eyre::WrapErr;

use crate::{
    camera::{FrameSource, NokhwaCamera},
    config::Config,
    decoder::{SymbolDecoder, SymbolDecoders},
    display::EguiDisplay,
    scanner::{Scanner, ScreenState, Ticker},
};

const LABEL_FONT_SIZE: f32 = 45.0;
const LABEL_HEIGHT_FRACTION: f32 = 0.2;
const BUTTON_HEIGHT: f32 = 48.0;
const LABEL_BACKGROUND: Color32 = Color32::from_gray(128);
const QUIT_KEY: Key = Key::Q;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    TogglePause,
    Stop,
    Quit,
}

/// Maps the keyboard state onto an action. `pressed` reports whether a key
/// went down this frame.
fn keyboard_action(pressed: impl Fn(Key) -> bool) -> Option<Action> {
    pressed(QUIT_KEY).then_some(Action::Quit)
}

struct Application<S, D> {
    scanner: Scanner<S, D>,
    display: EguiDisplay,
    ticker: Ticker,
}

impl<S, D> Application<S, D>
where
    S: FrameSource,
    D: SymbolDecoder,
{
    fn new(cc: &eframe::CreationContext, scanner: Scanner<S, D>, ticker: Ticker) -> Self {
        let display = EguiDisplay::new(cc.egui_ctx.clone(), scanner.state().label.clone());

        Application {
            scanner,
            display,
            ticker,
        }
    }

    /// Applies an action to the scanner, returning a command for the window
    /// if the action needs one.
    fn apply(&mut self, action: Action) -> Option<ViewportCommand> {
        tracing::debug!(?action, "got action");

        match action {
            Action::TogglePause => {
                self.scanner.toggle();
                None
            }
            Action::Stop => {
                self.scanner.stop();
                None
            }
            Action::Quit => Some(ViewportCommand::Close),
        }
    }

    fn label_panel(&self, ctx: &egui::Context) {
        let height = ctx.screen_rect().height() * LABEL_HEIGHT_FRACTION;

        TopBottomPanel::top("label_panel")
            .exact_height(height)
            .frame(egui::Frame::none().fill(LABEL_BACKGROUND))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    let text = self.display.label();
                    let rich = RichText::new(text).size(LABEL_FONT_SIZE).color(Color32::WHITE);

                    match label_link(text) {
                        Some(url) => {
                            if ui.link(rich).clicked() {
                                if let Err(err) = open::that(url.as_str()) {
                                    tracing::error!("could not open link: {err}");
                                }
                            }
                        }
                        None => {
                            ui.label(rich);
                        }
                    }
                });
            });
    }

    fn controls_panel(&self, ctx: &egui::Context) -> Option<Action> {
        let mut action = None;

        TopBottomPanel::bottom("controls_panel").show(ctx, |ui| {
            let width = ui.available_width();
            let stream = self.scanner.state().stream;

            if ui
                .add_sized([width, BUTTON_HEIGHT], Button::new(stream.toggle_caption()))
                .clicked()
            {
                action = Some(Action::TogglePause);
            }

            let stop = ui.add_enabled_ui(self.scanner.camera_open(), |ui| {
                ui.add_sized([width, BUTTON_HEIGHT], Button::new("Stop"))
            });
            if stop.inner.clicked() {
                action = Some(Action::Stop);
            }
        });

        action
    }

    fn preview_panel(&self, ctx: &egui::Context) {
        CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| match self.display.texture() {
                Some(texture) => {
                    ui.add(
                        egui::Image::new(SizedTexture::from_handle(texture))
                            .maintain_aspect_ratio(true)
                            .shrink_to_fit(),
                    );
                }
                None => {
                    ui.weak("Waiting for camera…");
                }
            });
        });
    }
}

impl<S, D> App for Application<S, D>
where
    S: FrameSource,
    D: SymbolDecoder,
{
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let key_action = ctx.input(|input| keyboard_action(|key| input.key_pressed(key)));

        let now = Instant::now();
        if self.ticker.poll(now) {
            self.scanner.tick(&mut self.display);
        }

        self.label_panel(ctx);
        let button_action = self.controls_panel(ctx);
        self.preview_panel(ctx);

        for action in key_action.into_iter().chain(button_action) {
            if let Some(command) = self.apply(action) {
                ctx.send_viewport_cmd(command);
            }
        }

        ctx.request_repaint_after(self.ticker.until_next(Instant::now()));
    }
}

/// Decoded text that is a web address gets shown as a clickable link.
fn label_link(text: &str) -> Option<url::Url> {
    let url = url::Url::parse(text.trim()).ok()?;

    matches!(url.scheme(), "http" | "https").then_some(url)
}

pub(crate) fn show_ui() -> eyre::Result<()> {
    let config = Config::load();

    let camera = NokhwaCamera::open(config.device_index, config.resolution_hint())
        .wrap_err("could not start camera")?;
    let decoders = SymbolDecoders::default();
    tracing::debug!(
        decoders = ?decoders.list().iter().map(|decoder| decoder.name()).collect::<Vec<_>>(),
        "loaded decoders"
    );

    let scanner = Scanner::new(
        camera,
        decoders,
        ScreenState::new(config.placeholder.clone()),
    );
    let ticker = Ticker::from_rate(config.frame_rate);
    tracing::debug!(period = ?ticker.period(), "scheduling scan loop");

    let options = NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("QR Code Scanner")
            .with_inner_size([800.0, 720.0]),
        ..Default::default()
    };

    run_native(
        "QR Code Scanner",
        options,
        Box::new(move |cc| Box::new(Application::new(cc, scanner, ticker))),
    )
    .map_err(|err| eyre::eyre!("egui error: {err}"))?;

    Ok(())
}
