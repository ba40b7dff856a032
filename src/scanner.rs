use std::time::{Duration, Instant};

use crate::{
    camera::{DeviceUnavailable, FrameSource},
    decoder::SymbolDecoder,
    display::Display,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum StreamState {
    #[default]
    Running,
    Paused,
}

impl StreamState {
    pub(crate) fn toggled(self) -> Self {
        match self {
            Self::Running => Self::Paused,
            Self::Paused => Self::Running,
        }
    }

    /// Caption of the control that moves away from this state.
    pub(crate) fn toggle_caption(self) -> &'static str {
        match self {
            Self::Running => "Pause",
            Self::Paused => "Play",
        }
    }
}

/// Everything the main screen owns between ticks.
#[derive(Debug)]
pub(crate) struct ScreenState {
    pub(crate) stream: StreamState,
    pub(crate) stopped: bool,
    pub(crate) label: String,
}

impl ScreenState {
    pub(crate) fn new(placeholder: impl Into<String>) -> Self {
        Self {
            stream: StreamState::default(),
            stopped: false,
            label: placeholder.into(),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Tick {
    Paused,
    Skipped,
    Scanned { symbols: usize },
}

/// Runs the read, decode and render steps against injected collaborators.
pub(crate) struct Scanner<S, D> {
    source: S,
    decoder: D,
    state: ScreenState,
}

impl<S, D> Scanner<S, D>
where
    S: FrameSource,
    D: SymbolDecoder,
{
    pub(crate) fn new(source: S, decoder: D, state: ScreenState) -> Self {
        Self {
            source,
            decoder,
            state,
        }
    }

    pub(crate) fn state(&self) -> &ScreenState {
        &self.state
    }

    pub(crate) fn camera_open(&self) -> bool {
        self.source.is_open()
    }

    pub(crate) fn toggle(&mut self) -> StreamState {
        self.state.stream = self.state.stream.toggled();
        tracing::debug!(stream = ?self.state.stream, "toggled stream");

        self.state.stream
    }

    /// Releases the frame source for good. Later ticks find it unavailable.
    pub(crate) fn stop(&mut self) {
        if self.state.stopped {
            return;
        }

        self.source.release();
        self.state.stopped = true;
        tracing::info!("stopped stream");
    }

    pub(crate) fn tick<P>(&mut self, display: &mut P) -> Tick
    where
        P: Display + ?Sized,
    {
        if self.state.stream == StreamState::Paused {
            return Tick::Paused;
        }

        let frame = match self.source.read() {
            Ok(frame) => frame,
            Err(DeviceUnavailable::Released) => {
                tracing::trace!("camera released, skipping tick");
                return Tick::Skipped;
            }
            Err(err) => {
                tracing::debug!("skipping tick: {err}");
                return Tick::Skipped;
            }
        };

        display.render(&frame);

        let symbols = self.decoder.decode(&frame);
        if let Some(symbol) = symbols.last() {
            tracing::info!(
                decoder = self.decoder.name(),
                count = symbols.len(),
                text = %symbol.summary(),
                "scan result"
            );

            self.state.label.clone_from(&symbol.text);
            display.set_label(&self.state.label);
        }

        Tick::Scanned {
            symbols: symbols.len(),
        }
    }
}

/// Fixed-rate schedule for the scan loop.
#[derive(Debug, Clone)]
pub(crate) struct Ticker {
    period: Duration,
    next: Option<Instant>,
}

impl Ticker {
    pub(crate) fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    pub(crate) fn from_rate(per_second: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / f64::from(per_second.max(1))))
    }

    pub(crate) fn period(&self) -> Duration {
        self.period
    }

    /// Returns true if a tick is due at `now`, and schedules the next one.
    ///
    /// Ticks missed while the caller was busy are dropped rather than fired
    /// back to back.
    pub(crate) fn poll(&mut self, now: Instant) -> bool {
        match self.next {
            Some(next) if now < next => false,
            Some(next) => {
                let following = next + self.period;
                self.next = Some(if following <= now {
                    now + self.period
                } else {
                    following
                });
                true
            }
            None => {
                self.next = Some(now + self.period);
                true
            }
        }
    }

    pub(crate) fn until_next(&self, now: Instant) -> Duration {
        self.next
            .map(|next| next.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}
