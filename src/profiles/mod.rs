//! Sample render profiles

pub mod deferred;
pub mod light_prepass;

pub use deferred::DeferredProfile;
pub use light_prepass::LightPrePassProfile;
