//! `HTMLAudioElement`-backed media element.
//!
//! Each element registers one DOM listener per [`MediaEvent`] and forwards the
//! notification to the sink it was created with. Listeners are removed again in
//! [`MediaElement::detach`], after which the element is inert.

use std::cell::RefCell;
use std::sync::Arc;

use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    playback::{MediaElement, MediaElementFactory, MediaEvent, MediaEventSink, MediaHandleId},
};
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

use crate::error::js_error;

type Listener = Closure<dyn FnMut()>;

/// Browser audio element wrapper.
pub struct WasmAudioElement {
    id: MediaHandleId,
    audio: HtmlAudioElement,
    listeners: RefCell<Vec<(MediaEvent, Listener)>>,
}

impl WasmAudioElement {
    /// Create a detached `<audio>` element wired to `sink`.
    pub fn new(sink: MediaEventSink) -> BridgeResult<Self> {
        let audio = HtmlAudioElement::new().map_err(|err| js_error("create audio", err))?;

        let mut listeners = Vec::with_capacity(MediaEvent::ALL.len());
        for event in MediaEvent::ALL {
            let sink = sink.clone();
            let listener: Listener = Closure::new(move || sink.emit(event));
            audio
                .add_event_listener_with_callback(
                    event.dom_name(),
                    listener.as_ref().unchecked_ref(),
                )
                .map_err(|err| js_error("add listener", err))?;
            listeners.push((event, listener));
        }

        Ok(Self {
            id: MediaHandleId::new(),
            audio,
            listeners: RefCell::new(listeners),
        })
    }

    /// Underlying DOM element, for hosts that want to attach it to the page.
    pub fn audio(&self) -> &HtmlAudioElement {
        &self.audio
    }
}

#[async_trait::async_trait(?Send)]
impl MediaElement for WasmAudioElement {
    fn id(&self) -> MediaHandleId {
        self.id
    }

    fn set_source(&self, src: &str) -> BridgeResult<()> {
        self.audio.set_src(src);
        Ok(())
    }

    fn clear_source(&self) -> BridgeResult<()> {
        self.audio
            .remove_attribute("src")
            .map_err(|err| js_error("remove src", err))
    }

    fn load(&self) -> BridgeResult<()> {
        self.audio.load();
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        let promise = self.audio.play().map_err(|err| js_error("play", err))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| js_error("play rejected", err))
    }

    fn pause(&self) -> BridgeResult<()> {
        self.audio.pause().map_err(|err| js_error("pause", err))
    }

    fn current_time(&self) -> f64 {
        self.audio.current_time()
    }

    fn set_current_time(&self, seconds: f64) -> BridgeResult<()> {
        self.audio.set_current_time(seconds);
        Ok(())
    }

    fn duration(&self) -> f64 {
        self.audio.duration()
    }

    fn volume(&self) -> f64 {
        self.audio.volume()
    }

    fn set_volume(&self, volume: f64) -> BridgeResult<()> {
        self.audio.set_volume(volume);
        Ok(())
    }

    fn playback_rate(&self) -> f64 {
        self.audio.playback_rate()
    }

    fn set_playback_rate(&self, rate: f64) -> BridgeResult<()> {
        self.audio.set_playback_rate(rate);
        Ok(())
    }

    fn detach(&self) {
        for (event, listener) in self.listeners.borrow_mut().drain(..) {
            let _ = self.audio.remove_event_listener_with_callback(
                event.dom_name(),
                listener.as_ref().unchecked_ref(),
            );
        }
        let _ = self.audio.pause();
        let _ = self.audio.remove_attribute("src");
        self.audio.load();
    }
}

/// Factory producing [`WasmAudioElement`]s.
///
/// Outside a browser window (workers, server-side rendering through a wasm
/// runtime) it reports [`BridgeError::NotAvailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmMediaFactory;

impl MediaElementFactory for WasmMediaFactory {
    fn create(&self, sink: MediaEventSink) -> BridgeResult<Arc<dyn MediaElement>> {
        if web_sys::window().is_none() {
            return Err(BridgeError::NotAvailable("window".into()));
        }
        let element: Arc<dyn MediaElement> = Arc::new(WasmAudioElement::new(sink)?);
        Ok(element)
    }
}
