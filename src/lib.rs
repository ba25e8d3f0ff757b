#![forbid(unsafe_code)]

pub mod analysis;
pub mod app;
pub mod cli;
pub mod editor;
pub mod formats;
pub mod gateway;
pub mod logging;
pub mod output;
pub mod register;
pub mod session;
pub mod viewer;
