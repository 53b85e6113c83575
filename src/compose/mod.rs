//! Operators over [`Sequence`](crate::Sequence)s.
//!
//! Every operator is a pair: a cloneable sequence type holding the upstream sequences and the
//! user functions, and a logic type that [`AsyncIter`](crate::iter::AsyncIter) drives. The
//! usual way to build them is through the provided methods on [`Sequence`](crate::Sequence).

mod map;
mod of_type;
mod scan;
mod select_many;
mod set_ops;
mod skip_last;

pub use map::{Map, MapLogic};
pub use of_type::{Downcast, OfType, OfTypeLogic};
pub use scan::{Scan, ScanLogic, Seed};
pub use select_many::{SelectMany, SelectManyLogic, Stage};
pub use set_ops::{Except, ExceptLogic, Intersect, IntersectLogic};
pub use skip_last::{SkipLast, SkipLastLogic};
