mod adapter;
mod list;

pub use adapter::ExternalToolAdapter;
pub use list::load_dynamic_identifiers;
