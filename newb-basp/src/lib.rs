//! Newb BASP
//!
//! Protocol layers for newb endpoints:
//! - Layer composition trait and timeout tokens (`layer`)
//! - BASP application framing, the innermost layer (`basp`)
//! - Sequence-number reassembly with timeout-driven flush (`ordering`)
//! - Stack adapter erasing a composed nest behind the endpoint's uniform
//!   interface (`stack`)
//!
//! The canonical stack wires ordering over BASP:
//!
//! ```
//! use newb_basp::{basp::Basp, ordering::Ordering, stack::Stack};
//!
//! let stack = Stack::new(Ordering::new(Basp));
//! # let _ = stack;
//! ```

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod basp;
pub mod layer;
pub mod ordering;
pub mod stack;

/// The canonical wire stack: ordering over BASP.
///
/// `OrderedBasp::default()` builds it with the default flush timeout.
pub type OrderedBasp = stack::Stack<ordering::Ordering<basp::Basp>>;

pub mod prelude {
    pub use crate::basp::{ActorId, Basp, BaspHeader, BaspMessage};
    pub use crate::layer::{Layer, TimeoutToken};
    pub use crate::ordering::Ordering;
    pub use crate::stack::Stack;
    pub use crate::OrderedBasp;
}
