#![allow(clippy::all)]

pub mod multi_stream;
pub mod named_streams;
pub mod simple_stream;
pub mod stream_deployer;
