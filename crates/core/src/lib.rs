#![deny(warnings)]

pub mod config;
pub mod emit;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod translate;
pub mod util;
