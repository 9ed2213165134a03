// Domain layer: data kinds, round summaries and the ports the collector talks through.

pub mod model;
pub mod ports;
