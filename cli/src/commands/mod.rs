//! Command implementations
//!
//! Each handler runs exactly one client operation and returns the decoded
//! response. Failures come back wrapped in a user-facing "Error ..." context.

mod category;
mod map;
mod marker;
mod me;
mod user;

pub use category::category;
pub use map::map;
pub use marker::marker;
pub use me::me;
pub use user::user;

/// Apply `set` to `builder` only when `value` is present.
fn with_opt<B, V>(builder: B, value: Option<V>, set: impl FnOnce(B, V) -> B) -> B {
    match value {
        Some(value) => set(builder, value),
        None => builder,
    }
}
