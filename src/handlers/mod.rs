pub mod admin;
pub mod chat;
pub mod flow;
pub mod health;
pub mod rooms;
pub mod webhook;
