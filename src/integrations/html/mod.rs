// src/integrations/html/mod.rs

pub mod element;
pub mod events;

pub use element::{ElementAdapter, ListenerId, MediaElement, NativeListener};
pub use events::MEDIA_EVENTS;
