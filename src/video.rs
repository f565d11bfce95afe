//! Overlay controls for the hero video.
//!
//! The player draws its own control bar (play/pause, seek track, volume
//! button and slider) over `.video-container` and drives the underlying
//! media element. Playback state is always read back from the element, so
//! the controls never disagree with what the browser is doing.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::LandingError;
use crate::platform::{Disposer, Dom, EventKind, MediaSnapshot, Platform, Rect, Target};

pub const CONTAINER_SELECTOR: &str = ".video-container";
pub const OVERLAY_PLAY_SELECTOR: &str = ".video-play-btn";
pub const VIDEO_SELECTOR: &str = ".video-container video";

const PLAYING_CLASS: &str = "playing";
const LOW_VOLUME_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Icon {
    Play,
    Pause,
    VolumeMute,
    VolumeDown,
    VolumeUp,
}

impl Icon {
    pub fn markup(self) -> &'static str {
        match self {
            Self::Play => "<i class=\"fas fa-play\"></i>",
            Self::Pause => "<i class=\"fas fa-pause\"></i>",
            Self::VolumeMute => "<i class=\"fas fa-volume-mute\"></i>",
            Self::VolumeDown => "<i class=\"fas fa-volume-down\"></i>",
            Self::VolumeUp => "<i class=\"fas fa-volume-up\"></i>",
        }
    }
}

/// Where the player sits in its lifecycle, derived from the media element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    /// Nothing has been played yet; an autoplay attempt may still be pending.
    Idle,
    Playing,
    PlayingMuted,
    Paused,
}

impl PlayerState {
    pub fn of(media: MediaSnapshot, started: bool) -> Self {
        match (media.paused, media.muted) {
            (true, _) if !started => Self::Idle,
            (true, _) => Self::Paused,
            (false, true) => Self::PlayingMuted,
            (false, false) => Self::Playing,
        }
    }
}

/// Volume glyph: muted (or silent), low below half volume, full otherwise.
pub fn volume_icon(muted: bool, volume: f64) -> Icon {
    if muted || volume <= 0.0 {
        Icon::VolumeMute
    } else if volume < LOW_VOLUME_THRESHOLD {
        Icon::VolumeDown
    } else {
        Icon::VolumeUp
    }
}

/// Share of the clip already played, in percent. Zero until the duration
/// is known.
pub fn progress_percent(current_time: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 || !current_time.is_finite() {
        return 0.0;
    }
    (current_time / duration * 100.0).clamp(0.0, 100.0)
}

/// Playback position for a click at `client_x` on the seek track.
pub fn seek_position(client_x: f64, track: Rect, duration: f64) -> Option<f64> {
    if !duration.is_finite() || duration <= 0.0 || track.width <= 0.0 {
        return None;
    }
    let fraction = ((client_x - track.left) / track.width).clamp(0.0, 1.0);
    Some(fraction * duration)
}

fn slider_value(volume: f64) -> String {
    format!("{volume}")
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoElements<N> {
    pub container: N,
    pub overlay_play: N,
    pub video: N,
}

impl<N: Clone + PartialEq + 'static> VideoElements<N> {
    pub fn locate<D: Dom<Node = N>>(dom: &D) -> Option<Self> {
        Some(Self {
            container: dom.query(CONTAINER_SELECTOR)?,
            overlay_play: dom.query(OVERLAY_PLAY_SELECTOR)?,
            video: dom.query(VIDEO_SELECTOR)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoControls<N> {
    pub root: N,
    pub play_pause: N,
    pub progress: N,
    pub progress_bar: N,
    pub volume_button: N,
    pub volume_slider: N,
}

impl<N: Clone + PartialEq + 'static> VideoControls<N> {
    fn build<D: Dom<Node = N>>(dom: &D, container: &N) -> Result<Self, LandingError> {
        let element = |tag: &str, class_name: &str| -> Result<N, LandingError> {
            let node = dom.create_element(tag)?;
            dom.set_class_name(&node, class_name);
            Ok(node)
        };

        let root = element("div", "video-controls")?;
        let play_pause = element("button", "video-play-pause")?;
        dom.set_inner_html(&play_pause, Icon::Pause.markup());
        let progress = element("div", "video-progress")?;
        let progress_bar = element("div", "video-progress-bar")?;
        let volume_container = element("div", "video-volume-container")?;
        let volume_button = element("button", "video-volume-btn")?;
        dom.set_inner_html(&volume_button, Icon::VolumeUp.markup());
        let slider_wrap = element("div", "video-volume-slider")?;
        let volume_slider = element("input", "video-volume-range")?;
        for (name, value) in [
            ("type", "range"),
            ("min", "0"),
            ("max", "1"),
            ("step", "0.1"),
            ("value", "1"),
        ] {
            dom.set_attribute(&volume_slider, name, value);
        }

        dom.append_child(&progress, &progress_bar);
        dom.append_child(&slider_wrap, &volume_slider);
        dom.append_child(&volume_container, &volume_button);
        dom.append_child(&volume_container, &slider_wrap);
        dom.append_child(&root, &play_pause);
        dom.append_child(&root, &progress);
        dom.append_child(&root, &volume_container);
        dom.append_child(container, &root);

        Ok(Self {
            root,
            play_pause,
            progress,
            progress_bar,
            volume_button,
            volume_slider,
        })
    }
}

struct PlayerInner<P: Platform> {
    platform: Rc<P>,
    elements: VideoElements<P::Node>,
    controls: VideoControls<P::Node>,
    started: Cell<bool>,
}

impl<P: Platform + 'static> PlayerInner<P> {
    fn media(&self) -> MediaSnapshot {
        self.platform.media_state(&self.elements.video)
    }

    fn set_play_icon(&self, icon: Icon) {
        self.platform
            .set_inner_html(&self.controls.play_pause, icon.markup());
    }

    fn set_volume_icon(&self, icon: Icon) {
        self.platform
            .set_inner_html(&self.controls.volume_button, icon.markup());
    }

    fn set_slider(&self, volume: f64) {
        self.platform
            .set_value(&self.controls.volume_slider, &slider_value(volume));
    }

    fn toggle_play_pause(self: &Rc<Self>) {
        let platform = &self.platform;
        let video = &self.elements.video;

        if !self.media().paused {
            platform.pause(video);
            self.set_play_icon(Icon::Play);
            return;
        }

        platform.set_muted(video, false);
        platform.set_volume(video, 1.0);
        self.set_slider(1.0);
        self.started.set(true);
        self.set_play_icon(Icon::Pause);
        platform.add_class(&self.elements.container, PLAYING_CLASS);
        self.set_volume_icon(Icon::VolumeUp);

        let player = Rc::clone(self);
        platform.play(
            video,
            Box::new(move |reason: String| {
                log::warn!("video playback refused: {reason}");
                player.set_play_icon(Icon::Play);
                player
                    .platform
                    .remove_class(&player.elements.container, PLAYING_CLASS);
            }),
        );
    }

    fn toggle_mute(&self) {
        let platform = &self.platform;
        let video = &self.elements.video;

        if self.media().muted {
            platform.set_muted(video, false);
            platform.set_volume(video, 1.0);
            self.set_slider(1.0);
            self.set_volume_icon(volume_icon(false, 1.0));
        } else {
            platform.set_muted(video, true);
            self.set_slider(0.0);
            self.set_volume_icon(Icon::VolumeMute);
        }
    }

    /// Volume drives the mute flag: a silent slider mutes the element.
    fn apply_volume(&self, volume: f64) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let muted = volume == 0.0;
        self.platform.set_volume(&self.elements.video, volume);
        self.platform.set_muted(&self.elements.video, muted);
        self.set_volume_icon(volume_icon(muted, volume));
    }

    fn on_volume_input(&self) {
        let raw = self.platform.value(&self.controls.volume_slider);
        match raw.trim().parse::<f64>() {
            Ok(volume) => self.apply_volume(volume),
            Err(_) => log::debug!("ignoring volume slider value {raw:?}"),
        }
    }

    fn seek(&self, client_x: f64) {
        let track = self.platform.bounding_rect(&self.controls.progress);
        if let Some(position) = seek_position(client_x, track, self.media().duration) {
            self.platform
                .set_current_time(&self.elements.video, position);
        }
    }

    fn update_progress(&self) {
        let media = self.media();
        let percent = progress_percent(media.current_time, media.duration);
        self.platform
            .set_style(&self.controls.progress_bar, "width", &format!("{percent}%"));
    }

    fn on_ended(&self) {
        self.set_play_icon(Icon::Play);
        self.platform
            .remove_class(&self.elements.container, PLAYING_CLASS);
    }

    fn on_metadata(&self) {
        let platform = &self.platform;
        let video = &self.elements.video;

        if platform.has_attribute(video, "autoplay") && platform.has_attribute(video, "muted") {
            platform.set_muted(video, true);
            platform.play(
                video,
                Box::new(|reason: String| log::warn!("autoplay prevented: {reason}")),
            );
            self.set_slider(0.0);
            self.set_volume_icon(Icon::VolumeMute);
            return;
        }

        let volume = self.media().volume;
        self.set_slider(volume);
        self.apply_volume(volume);
    }
}

pub struct VideoPlayer<P: Platform> {
    inner: Rc<PlayerInner<P>>,
    disposer: Disposer,
}

impl<P: Platform + 'static> VideoPlayer<P> {
    pub fn state(&self) -> PlayerState {
        PlayerState::of(self.inner.media(), self.inner.started.get())
    }

    pub fn controls(&self) -> &VideoControls<P::Node> {
        &self.inner.controls
    }

    pub fn into_disposer(self) -> Disposer {
        self.disposer
    }
}

pub fn init_video_player<P: Platform + 'static>(
    platform: &Rc<P>,
    elements: VideoElements<P::Node>,
) -> Result<VideoPlayer<P>, LandingError> {
    let controls = VideoControls::build(platform.as_ref(), &elements.container)?;
    let inner = Rc::new(PlayerInner {
        platform: Rc::clone(platform),
        elements,
        controls,
        started: Cell::new(false),
    });

    let mut disposer = Disposer::new();
    let node = |n: &P::Node| Target::Node(n.clone());

    for button in [&inner.elements.overlay_play, &inner.controls.play_pause] {
        let player = Rc::clone(&inner);
        disposer.listen(platform, node(button), EventKind::Click, move |_| {
            player.toggle_play_pause()
        });
    }
    {
        let player = Rc::clone(&inner);
        disposer.listen(
            platform,
            node(&inner.controls.volume_button),
            EventKind::Click,
            move |_| player.toggle_mute(),
        );
    }
    {
        let player = Rc::clone(&inner);
        disposer.listen(
            platform,
            node(&inner.controls.volume_slider),
            EventKind::Input,
            move |_| player.on_volume_input(),
        );
    }
    {
        let player = Rc::clone(&inner);
        disposer.listen(
            platform,
            node(&inner.controls.progress),
            EventKind::Click,
            move |event| player.seek(event.client_x()),
        );
    }
    {
        let player = Rc::clone(&inner);
        disposer.listen(
            platform,
            node(&inner.elements.video),
            EventKind::TimeUpdate,
            move |_| player.update_progress(),
        );
    }
    {
        let player = Rc::clone(&inner);
        disposer.listen(
            platform,
            node(&inner.elements.video),
            EventKind::Ended,
            move |_| player.on_ended(),
        );
    }
    {
        let player = Rc::clone(&inner);
        disposer.listen(
            platform,
            node(&inner.elements.video),
            EventKind::LoadedMetadata,
            move |_| player.on_metadata(),
        );
    }
    {
        let platform = Rc::clone(platform);
        let root = inner.controls.root.clone();
        disposer.defer(move || platform.remove(&root));
    }

    // Metadata may have loaded before the listener was attached.
    if platform.has_metadata(&inner.elements.video) {
        inner.on_metadata();
    }

    log::debug!("video player ready");
    Ok(VideoPlayer { inner, disposer })
}
