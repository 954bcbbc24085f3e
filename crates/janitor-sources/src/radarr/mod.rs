mod client;

pub use client::RadarrClient;
