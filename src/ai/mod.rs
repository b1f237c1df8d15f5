mod client;
mod inference;

pub use client::SummarizerClient;
