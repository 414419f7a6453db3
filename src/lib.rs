pub mod dashboard;
pub mod interaction;
pub mod session;
pub mod simulation;
pub mod timeline;
pub mod treemap;
pub mod util;
pub mod viewport;
