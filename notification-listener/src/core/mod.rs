/*!
Core modules for the event-driven notification listener
*/

pub mod command_channel;
pub mod config;
pub mod context;
pub mod distributor;
pub mod error;
pub mod event_store;
pub mod event_system;
pub mod facade;
pub mod normalizer;
pub mod output_plugins;
pub mod pipeline;
pub mod record;
pub mod source_filter;
pub mod tracker;
