pub mod availability;
pub mod chatbot;
pub mod events;
pub mod flow;
pub mod payment;
pub mod pricing;
