mod roles;
mod source;

// export
pub use roles::roles;
pub use source::find_source;
