//! Unit tests mirroring the source tree

mod algorithm;
mod analysis;
mod io;
mod spatial;
