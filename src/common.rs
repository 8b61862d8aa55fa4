pub mod defaults;
pub mod names;
pub mod ordering;
pub mod traversal;

pub use defaults::*;
pub use names::*;
pub use ordering::*;
pub use traversal::*;
