// Domain layer: records and ports. No framework types leak in here.

pub mod model;
pub mod ports;
