//! Reasoning-process integration
//!
//! ```text
//! caller -> gateway -> ReasoningRuntime::run_turn -> FragmentStream
//!                                                        |
//!                                    collect_response (aggregator)
//!                                                        |
//!                                                 AggregatedResponse
//! ```
//!
//! The runtime seam keeps the natural-language classification external: the
//! core only consumes the ordered fragment stream a runtime produces and
//! exposes the ingestion toolkit for the runtime to call.

pub mod aggregator;
pub mod fragment;
pub mod gemini;
pub mod runtime;

pub use aggregator::{collect_response, ResponseAggregator};
pub use fragment::{ExecutionOutcome, ResponseFragment};
pub use gemini::GeminiRuntime;
pub use runtime::{FragmentStream, ReasoningRuntime, ScriptedRuntime};
