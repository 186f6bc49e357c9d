//! Audio decode path: container setup, decode loop, interleaving and PCM output

pub mod container;
pub mod decode_loop;
pub mod interleave;
pub mod sink;
pub mod types;
