pub mod commands;
pub mod controller;
pub mod handlers;
pub mod messenger;
pub mod settings;
