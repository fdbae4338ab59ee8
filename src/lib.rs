//! Turn language-model command output into validated, sequential editor commands.
//!
//! The pipeline: [`extract`] recovers an ordered command list from whatever
//! shape the model produced, [`registry::validation`] checks required
//! parameters, [`invoke`] sends each command through a caller-owned
//! [`remote::ConnectionProvider`], and [`batch`] ties it together so that one
//! bad command never stops the rest.

pub mod batch;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod invoke;
pub mod literal;
pub mod params;
pub mod paths;
pub mod registry;
pub mod remote;
pub mod report;
pub mod settings;

pub use batch::{run_batch, BatchExecutor, BatchResult, CancelFlag};
pub use envelope::{ResponseEnvelope, Status};
pub use error::{ErrorKind, InvocationError, ParseError, ValidationError};
pub use extract::{extract, CommandCandidate, CommandInput};
pub use invoke::{execute_single, invoke};
pub use registry::CommandTable;
pub use remote::{Connection, ConnectionProvider, ConnectionSlot, TransportError};
