pub mod end;
pub mod gate;
pub mod schema;
pub mod start;
