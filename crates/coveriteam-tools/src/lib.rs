//! # coveriteam-tools
//!
//! Reference implementations of the collaborator traits in
//! `coveriteam_core::traits`:
//!
//! - `ToolRegistry`: TOML tool descriptors, looked up by id
//! - `ProcessRunner`: `ToolRunner` over `std::process`
//! - `PatternResultParser`: `ResultParser` driven by the descriptor's verdict rules
//! - `ZipArchiver`: `Archiver` over the `zip` executable
//!
//! ```rust,ignore
//! let registry = ToolRegistry::from_dir(Path::new("tools"))?;
//! let runner = Arc::new(ProcessRunner::new(work_dir.join("runs")));
//! let cpachecker = registry.get("cpachecker")?;
//! let parser = PatternResultParser::for_tool(cpachecker)?;
//! ```

pub mod archive;
pub mod parser;
pub mod registry;
pub mod runner;

pub use archive::ZipArchiver;
pub use parser::PatternResultParser;
pub use registry::ToolRegistry;
pub use runner::ProcessRunner;
