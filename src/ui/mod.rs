mod app;
mod form;
mod view;

pub use app::{run, App, Mode};
