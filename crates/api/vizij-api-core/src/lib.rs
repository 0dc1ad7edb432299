//! vizij-api-core: value kinds, axis masks and component math (engine-agnostic)

pub mod axis;
pub mod coercion;
pub mod interp;
pub mod value;

pub use axis::AxisConstraint;
pub use coercion::{coerce, CoercionError};
pub use interp::lerp_value;
pub use value::{Value, ValueKind};
