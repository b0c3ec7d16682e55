pub mod conversion_pipeline;

pub use conversion_pipeline::ConversionPipeline;
