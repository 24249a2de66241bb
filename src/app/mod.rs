// Application layer: background tasks built on the domain ports.

pub mod tasks;
