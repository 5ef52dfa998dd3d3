// Domain layer: trip models, ports, and the settlement services.
// Services are pure; all I/O lives behind the ports.

pub mod model;
pub mod ports;

pub mod services;
