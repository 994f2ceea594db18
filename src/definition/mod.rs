pub mod conversion;
pub mod function;
pub mod node;
pub mod reference;

pub use conversion::*;
pub use function::*;
pub use node::*;
pub use reference::*;
