//! # System Constants
//!
//! Fixed names and diagnostic strings shared across the worker: the job type
//! routed to the simulation engine, the model tags injected into the engine
//! configuration, and the workspace snapshot file name.

/// Job type handled by the simulation engine; anything else yields the
/// unsupported-type result.
pub const FLOPY_CALCULATION_TYPE: &str = "flopy_calculation";

/// Model name tag forced into the flow ("mf") sub-configuration.
pub const FLOW_MODEL_NAME: &str = "mf";

/// Model name tag forced into the transport ("mt") sub-configuration.
pub const TRANSPORT_MODEL_NAME: &str = "mt";

/// File name of the unmutated job snapshot inside a workspace directory.
pub const CONFIGURATION_FILE_NAME: &str = "configuration.json";

/// Directory under the data root that collects results which could not be
/// published and have no workspace of their own.
pub const UNDELIVERABLE_DIR_NAME: &str = "undeliverable";

/// Diagnostic message for jobs whose type is not `flopy_calculation`.
pub const UNSUPPORTED_TYPE_MESSAGE: &str = "Internal Server Error. Request data does not fit. \
     \"type\" should have the content \"flopy_calculation\"";

/// Longest `calculation_id` accepted before it is used as a path segment.
pub const MAX_CALCULATION_ID_LEN: usize = 128;

/// Status code string for successful calculations.
pub const STATUS_OK: &str = "200";

/// Status code string for every failure shape.
pub const STATUS_ERROR: &str = "500";
