//! Light control: grounding spoken parameters and translating them into
//! Home Assistant service calls.

mod actions;
mod area;
mod brightness;
mod color;

pub use actions::ActionError;
pub use actions::ActionKind;
pub use actions::ActionRequest;
pub use actions::LightActions;
pub use area::AliasOverlap;
pub use area::AreaRegistry;
pub use brightness::Brightness;
pub use color::color_words;
pub use color::resolve_color;
pub use color::ColorDirective;
