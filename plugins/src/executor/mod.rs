pub mod renderers;
pub mod strategies;
