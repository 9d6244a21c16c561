use std::error::Error;

pub mod api;
pub mod assets;
pub mod config;
pub mod error;
pub mod handler;
pub mod isbn;
pub mod library;
pub mod lookup;
pub mod model;
pub mod reminder;
pub mod render;
pub mod routes;
pub mod scanner;
pub mod view;

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
