pub mod capture;
pub mod controls;
pub mod permissions;
pub mod preview;

pub use capture::*;
pub use controls::*;
pub use permissions::*;
pub use preview::*;
