// Path tracking algorithms module

pub mod direct_input;

pub use direct_input::DirectInputController;
