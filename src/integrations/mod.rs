// src/integrations/mod.rs
//
// Player Integrations
//
// Every backend satisfies the PlayerAdapter contract:
// - html: push-based, DOM-style media elements
// - avplay: poll-based, AV playback APIs without play/pause callbacks

pub mod adapter;
pub mod avplay;
pub mod html;

pub use adapter::{AdapterKind, EventHandler, PlayerAdapter};
pub use avplay::{AvPlayAdapter, AvPlayApi, AvPlayListener, AvPlayState};
pub use html::{ElementAdapter, MediaElement, NativeListener, MEDIA_EVENTS};
