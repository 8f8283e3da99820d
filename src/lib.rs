pub mod ffi;
pub mod record;
pub mod utils;
pub mod writer;

pub use record::DefinitionRecord;
pub use writer::{write, write_definition, Status};

#[ctor::ctor]
fn init() {
    utils::init_logger();

    tracing::debug!(
        "definition_writer {} loaded, working directory {:?}",
        env!("CARGO_PKG_VERSION"),
        std::env::current_dir()
    );
}

#[ctor::dtor]
fn uninit() {
    tracing::debug!("definition_writer unloading");
}
