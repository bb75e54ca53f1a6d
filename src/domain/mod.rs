// Domain layer: core models and ports (interfaces). No HTTP or file I/O here.

pub mod model;
pub mod money;
pub mod ports;
