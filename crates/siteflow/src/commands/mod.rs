pub mod deploy;
pub mod destroy;
pub mod plan;
pub mod release;
pub mod up;
pub mod validate;
