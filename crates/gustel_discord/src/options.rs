//! Typed access to slash command options.

use serenity::all::{
    Attachment, CommandInteraction, PartialMember, ResolvedOption, ResolvedValue, Role, User,
};

use crate::error::{DiscordError, Result};

/// Options of an invoked command with its subcommand path peeled off.
///
/// For `/brotato add run character:x` the path is `["add", "run"]` and the
/// options are those of `run`.
pub struct CommandArgs<'a> {
    path: Vec<&'a str>,
    options: Vec<ResolvedOption<'a>>,
}

impl<'a> CommandArgs<'a> {
    pub fn from_command(command: &'a CommandInteraction) -> Self {
        let mut path = Vec::new();
        let mut options = command.data.options();

        while let [only] = options.as_slice() {
            if !matches!(
                only.value,
                ResolvedValue::SubCommand(_) | ResolvedValue::SubCommandGroup(_)
            ) {
                break;
            }
            let only = options.remove(0);
            path.push(only.name);
            if let ResolvedValue::SubCommand(inner) | ResolvedValue::SubCommandGroup(inner) =
                only.value
            {
                options = inner;
            }
        }

        Self { path, options }
    }

    /// Subcommand group and subcommand names, outermost first.
    pub fn path(&self) -> &[&'a str] {
        &self.path
    }

    fn value(&self, name: &str) -> Option<&ResolvedValue<'a>> {
        self.options
            .iter()
            .find(|option| option.name == name)
            .map(|option| &option.value)
    }

    pub fn str(&self, name: &str) -> Option<&'a str> {
        match self.value(name) {
            Some(ResolvedValue::String(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.value(name) {
            Some(ResolvedValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.value(name) {
            Some(ResolvedValue::Boolean(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn role(&self, name: &str) -> Option<&'a Role> {
        match self.value(name) {
            Some(ResolvedValue::Role(role)) => Some(*role),
            _ => None,
        }
    }

    pub fn user(&self, name: &str) -> Option<(&'a User, Option<&'a PartialMember>)> {
        match self.value(name) {
            Some(ResolvedValue::User(user, member)) => Some((*user, *member)),
            _ => None,
        }
    }

    pub fn attachment(&self, name: &str) -> Option<&'a Attachment> {
        match self.value(name) {
            Some(ResolvedValue::Attachment(attachment)) => Some(*attachment),
            _ => None,
        }
    }

    pub fn required_str(&self, name: &'static str) -> Result<&'a str> {
        self.str(name).ok_or(DiscordError::MissingOption(name))
    }

    pub fn required_int(&self, name: &'static str) -> Result<i64> {
        self.int(name).ok_or(DiscordError::MissingOption(name))
    }

    pub fn required_role(&self, name: &'static str) -> Result<&'a Role> {
        self.role(name).ok_or(DiscordError::MissingOption(name))
    }

    pub fn required_attachment(&self, name: &'static str) -> Result<&'a Attachment> {
        self.attachment(name).ok_or(DiscordError::MissingOption(name))
    }
}
