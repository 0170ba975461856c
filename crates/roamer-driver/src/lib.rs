pub mod coverage;
pub mod driver;
pub mod scripted;
pub mod target;

pub use coverage::{Coverage, CoverageCounters};
pub use driver::{Driver, DriverError};
pub use scripted::{CallLog, DriverCall, ScriptedDriver, ScriptedPage};
pub use target::{Bounds, PageSignature, Target, TargetKind};
