//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod generator;

pub use generator::{
    CheckOutcome, FixtureRequest, GenerationReport, GeneratorService, RenderedFixture,
    WriteStatus,
};
