use colored::Colorize;
use errors::{SessionError, TimecodeError, ValidationError};

#[derive(Debug)]
pub struct UxError {
    pub what: String,
    pub why: Option<String>,
    pub how_to_fix: Vec<String>,
    pub suggested_command: Option<String>,
}

impl UxError {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            why: None,
            how_to_fix: Vec::new(),
            suggested_command: None,
        }
    }

    pub fn why(mut self, reason: impl Into<String>) -> Self {
        self.why = Some(reason.into());
        self
    }

    pub fn fix(mut self, suggestion: impl Into<String>) -> Self {
        self.how_to_fix.push(suggestion.into());
        self
    }

    pub fn suggest(mut self, cmd: impl Into<String>) -> Self {
        self.suggested_command = Some(cmd.into());
        self
    }

    pub fn display(&self) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), self.what.white().bold());

        if let Some(why) = &self.why {
            eprintln!("       {}", why.dimmed());
        }

        if !self.how_to_fix.is_empty() {
            eprintln!();
            eprintln!("{}", "How to fix:".yellow().bold());
            for (i, fix) in self.how_to_fix.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, fix);
            }
        }

        if let Some(cmd) = &self.suggested_command {
            eprintln!();
            eprintln!("{}", "Try this:".green().bold());
            eprintln!("  $ {}", cmd.cyan());
        }
        eprintln!();
    }
}

impl std::fmt::Display for UxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.what)
    }
}

impl std::error::Error for UxError {}

pub fn config_error(message: &str) -> UxError {
    UxError::new(format!("Configuration error: {message}"))
        .why("The config file, TN_* variables or flags hold an invalid value")
        .fix("Check the file passed with --config")
        .fix("Unset TN_* variables you did not mean to set")
}

pub fn upgrade_required(resource: &str, limit: usize) -> UxError {
    let why = if limit == 0 {
        format!("{resource} is a Pro feature")
    } else {
        format!("The free tier allows {limit} {resource}")
    };
    UxError::new(format!("Upgrade required: {resource}"))
        .why(why)
        .fix("Upgrade to Pro, then pass --pro or set TN_PRO=true")
        .fix("Or delete something you no longer need")
        .suggest("takenote session list")
}

pub fn session_not_found(id: &str) -> UxError {
    UxError::new(format!("Session not found: {id}"))
        .why("No session with this id belongs to the current user")
        .fix("Check the id, or the --user the session was created with")
        .suggest("takenote session list")
}

pub fn note_not_found(id: &str) -> UxError {
    UxError::new(format!("Note not found: {id}"))
        .why("The id does not match a note in this session")
        .fix("Pass --session if the note lives in an older session")
        .suggest("takenote session show --all")
}

pub fn invalid_timecode(input: &str, error: &TimecodeError) -> UxError {
    UxError::new(format!("Invalid timecode: '{input}'"))
        .why(error.to_string())
        .fix("Use HH:MM:SS:FF, or HH:MM:SS;FF at drop-frame rates")
        .fix("Keep frames below the session frame rate")
        .suggest("takenote note custom 10:30:00:00 \"Late slate\"")
}

pub fn save_failed(reason: &str) -> UxError {
    UxError::new("Session could not be saved")
        .why(reason.to_string())
        .fix("Check that the data directory is writable")
        .fix("Run the command again; unsaved changes were not kept")
}

pub fn merge_inputs_missing() -> UxError {
    UxError::new("Neither session file exists")
        .why("A merge needs at least one copy of the session")
        .suggest("takenote merge local.json remote.json")
}

/// Maps engine errors that have a clear next step onto friendly messages.
pub fn from_session(error: SessionError) -> anyhow::Error {
    match &error {
        SessionError::UpgradeRequired { resource, limit } => {
            upgrade_required(resource, *limit).into()
        }
        SessionError::Validation(ValidationError::SessionNotFound { id }) => {
            session_not_found(id).into()
        }
        SessionError::Validation(
            ValidationError::NoteNotFound { id } | ValidationError::NoteDeleted { id },
        ) => note_not_found(id).into(),
        _ => error.into()
    }
}
