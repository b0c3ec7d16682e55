pub mod pipelines;
pub mod render;
pub mod router;
pub mod shell;
