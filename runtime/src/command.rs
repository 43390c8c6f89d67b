//! The `Command` trait implemented by every registered command.

use serde_json::Value;

use crate::context::{CommandContext, CommandResult};
use crate::descriptor::CommandDescriptor;
use crate::error::CommandError;
use crate::output::OutputSink;

/// A runnable command: static metadata plus business logic.
///
/// # Examples
///
/// ```
/// use command_kit_core::FlagDefinition;
/// use command_kit_runtime::{Command, CommandContext, CommandDescriptor, CommandError};
/// use serde_json::{Value, json};
///
/// struct Hello {
///     descriptor: CommandDescriptor,
/// }
///
/// impl Command for Hello {
///     fn descriptor(&self) -> &CommandDescriptor {
///         &self.descriptor
///     }
///
///     fn run(&self, ctx: &mut CommandContext) -> Result<Value, CommandError> {
///         let name = ctx.flag_str("name").unwrap_or("world");
///         Ok(json!({ "greeting": format!("hello {name}") }))
///     }
/// }
///
/// let hello = Hello {
///     descriptor: CommandDescriptor::builder("hello")
///         .flag(FlagDefinition::string("name", "who to greet"))
///         .build()
///         .unwrap(),
/// };
/// assert_eq!(hello.descriptor().id(), "hello");
/// ```
pub trait Command {
    fn descriptor(&self) -> &CommandDescriptor;

    fn run(&self, ctx: &mut CommandContext) -> Result<Value, CommandError>;

    /// Human rendering of a successful result, also used for error data.
    fn display(&self, result: &CommandResult, out: &mut dyn OutputSink) {
        result.display(out);
    }
}
