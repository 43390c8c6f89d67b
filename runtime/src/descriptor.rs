//! Immutable per-command metadata.
//!
//! A [`CommandDescriptor`] is built once per command type and handed to the
//! lifecycle on every invocation. Building it assembles the [`FlagSet`], so
//! declaration mistakes fail here rather than at run time.

use command_kit_core::{
    CredentialRequirements, DeprecationNotice, FlagDefinition, FlagDefinitionError, FlagSet,
    FlagSetBuilder, VarargsConfig, synthesize_usage,
};
use serde::Serialize;
use thiserror::Error;

use crate::output::TableColumn;

/// One positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgSpec {
    pub name: String,
    pub required: bool,
    pub description: String,
}

impl ArgSpec {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error(transparent)]
    Flag(#[from] FlagDefinitionError),
    /// A required positional follows an optional one.
    #[error("required argument {0} cannot follow an optional argument")]
    InvalidArgOrder(String),
    /// A positional reuses a flag or argument name.
    #[error("duplicate argument name: {0}")]
    DuplicateArgName(String),
}

#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    id: String,
    description: String,
    long_description: Option<String>,
    examples: Vec<String>,
    flags: FlagSet,
    args: Vec<ArgSpec>,
    varargs: VarargsConfig,
    requires_project: bool,
    credentials: CredentialRequirements,
    deprecated: Option<DeprecationNotice>,
    lifecycle_events: Vec<String>,
    table_columns: Vec<TableColumn>,
}

impl CommandDescriptor {
    /// Starts a builder for the command with the given id.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_kit_core::FlagDefinition;
    /// use command_kit_runtime::CommandDescriptor;
    ///
    /// let descriptor = CommandDescriptor::builder("hello")
    ///     .description("say hello")
    ///     .flag(FlagDefinition::string("name", "who to greet").with_char('n').required())
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(descriptor.id(), "hello");
    /// assert_eq!(descriptor.flags().names(), vec!["name", "json", "loglevel"]);
    /// ```
    pub fn builder(id: impl Into<String>) -> CommandDescriptorBuilder {
        CommandDescriptorBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn long_description(&self) -> Option<&str> {
        self.long_description.as_deref()
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    pub fn varargs(&self) -> &VarargsConfig {
        &self.varargs
    }

    pub fn requires_project(&self) -> bool {
        self.requires_project
    }

    pub fn credentials(&self) -> CredentialRequirements {
        self.credentials
    }

    pub fn deprecated(&self) -> Option<&DeprecationNotice> {
        self.deprecated.as_ref()
    }

    pub fn lifecycle_events(&self) -> &[String] {
        &self.lifecycle_events
    }

    pub fn table_columns(&self) -> &[TableColumn] {
        &self.table_columns
    }

    /// Usage grammar for this command's flags and varargs.
    pub fn usage(&self) -> String {
        synthesize_usage(&self.flags, &self.varargs)
    }
}

#[derive(Debug, Clone)]
pub struct CommandDescriptorBuilder {
    id: String,
    description: String,
    long_description: Option<String>,
    examples: Vec<String>,
    flags: Vec<FlagDefinition>,
    args: Vec<ArgSpec>,
    varargs: VarargsConfig,
    requires_project: bool,
    credentials: CredentialRequirements,
    deprecated: Option<DeprecationNotice>,
    lifecycle_events: Vec<String>,
    table_columns: Vec<TableColumn>,
}

impl CommandDescriptorBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            long_description: None,
            examples: Vec::new(),
            flags: Vec::new(),
            args: Vec::new(),
            varargs: VarargsConfig::Disabled,
            requires_project: false,
            credentials: CredentialRequirements::default(),
            deprecated: None,
            lifecycle_events: Vec::new(),
            table_columns: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn long_description(mut self, long_description: impl Into<String>) -> Self {
        self.long_description = Some(long_description.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn flag(mut self, flag: FlagDefinition) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn flags(mut self, flags: impl IntoIterator<Item = FlagDefinition>) -> Self {
        self.flags.extend(flags);
        self
    }

    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn varargs(mut self, varargs: impl Into<VarargsConfig>) -> Self {
        self.varargs = varargs.into();
        self
    }

    pub fn requires_project(mut self) -> Self {
        self.requires_project = true;
        self
    }

    pub fn supports_username(mut self) -> Self {
        self.credentials.supports_username = true;
        self
    }

    pub fn requires_username(mut self) -> Self {
        self.credentials.requires_username = true;
        self
    }

    pub fn supports_devhub_username(mut self) -> Self {
        self.credentials.supports_devhub_username = true;
        self
    }

    pub fn requires_devhub_username(mut self) -> Self {
        self.credentials.requires_devhub_username = true;
        self
    }

    pub fn deprecated(mut self, notice: DeprecationNotice) -> Self {
        self.deprecated = Some(notice);
        self
    }

    pub fn lifecycle_event(mut self, name: impl Into<String>) -> Self {
        self.lifecycle_events.push(name.into());
        self
    }

    pub fn table_column(mut self, column: impl Into<TableColumn>) -> Self {
        self.table_columns.push(column.into());
        self
    }

    /// Assembles the flag set and checks positional arguments.
    ///
    /// # Errors
    ///
    /// - [`DescriptorError::Flag`] for any flag declaration problem.
    /// - [`DescriptorError::InvalidArgOrder`] when a required positional
    ///   follows an optional one.
    /// - [`DescriptorError::DuplicateArgName`] when a positional shares its
    ///   name with a flag or another positional.
    pub fn build(self) -> Result<CommandDescriptor, DescriptorError> {
        let flags = FlagSetBuilder::new()
            .flags(self.flags)
            .credentials(self.credentials)
            .build()?;

        let mut seen_optional = false;
        for (i, arg) in self.args.iter().enumerate() {
            if flags.contains(&arg.name) || self.args[..i].iter().any(|a| a.name == arg.name) {
                return Err(DescriptorError::DuplicateArgName(arg.name.clone()));
            }
            if arg.required && seen_optional {
                return Err(DescriptorError::InvalidArgOrder(arg.name.clone()));
            }
            seen_optional |= !arg.required;
        }

        Ok(CommandDescriptor {
            id: self.id,
            description: self.description,
            long_description: self.long_description,
            examples: self.examples,
            flags,
            args: self.args,
            varargs: self.varargs,
            requires_project: self.requires_project,
            credentials: self.credentials,
            deprecated: self.deprecated,
            lifecycle_events: self.lifecycle_events,
            table_columns: self.table_columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_injects_credential_flags() {
        let descriptor = CommandDescriptor::builder("org:list")
            .requires_username()
            .build()
            .unwrap();
        assert_eq!(
            descriptor.flags().names(),
            vec!["targetusername", "apiversion", "json", "loglevel"]
        );
        assert!(descriptor.credentials().requires_username);
    }

    #[test]
    fn test_build_propagates_flag_errors() {
        let err = CommandDescriptor::builder("bad")
            .flag(FlagDefinition::string("Bad", "upper case"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DescriptorError::Flag(FlagDefinitionError::InvalidFlagName("Bad".into()))
        );
    }

    #[test]
    fn test_build_rejects_flag_relating_to_itself() {
        for flag in [
            FlagDefinition::string("a", "d").exclusive(["a"]),
            FlagDefinition::string("a", "d").depends_on(["a"]),
        ] {
            let err = CommandDescriptor::builder("x").flag(flag).build().unwrap_err();
            assert!(matches!(
                err,
                DescriptorError::Flag(FlagDefinitionError::SelfReferencingRelation { ref flag, .. })
                    if flag == "a"
            ));
        }
    }

    #[test]
    fn test_required_arg_after_optional() {
        let err = CommandDescriptor::builder("copy")
            .arg(ArgSpec::optional("source", "from"))
            .arg(ArgSpec::required("target", "to"))
            .build()
            .unwrap_err();
        assert_eq!(err, DescriptorError::InvalidArgOrder("target".into()));
    }

    #[test]
    fn test_arg_name_collides_with_flag() {
        let err = CommandDescriptor::builder("copy")
            .flag(FlagDefinition::string("source", "from"))
            .arg(ArgSpec::required("source", "from"))
            .build()
            .unwrap_err();
        assert_eq!(err, DescriptorError::DuplicateArgName("source".into()));
    }

    #[test]
    fn test_usage_includes_varargs() {
        let descriptor = CommandDescriptor::builder("env:set")
            .varargs(VarargsConfig::required())
            .build()
            .unwrap();
        assert!(descriptor.usage().starts_with("name=value... "));
    }
}
