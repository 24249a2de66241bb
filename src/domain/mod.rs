// Domain layer: the settings object, marketing models and ports (interfaces).

pub mod model;
pub mod ports;
pub mod settings;
