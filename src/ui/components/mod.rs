mod command_input;
mod confirm;
mod input;
mod key_result;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::ConfirmPrompt;
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
