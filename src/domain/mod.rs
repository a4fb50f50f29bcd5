// Domain layer: row model, schema contract and the ports the pipeline runs against.

pub mod model;
pub mod ports;
