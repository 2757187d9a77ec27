//! Mail Templates
//!
//! Subjects and plain-text bodies for the lifecycle mails. Template data is
//! the pair (username, token), like the upstream mail templates.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateName {
    PleaseConfirm,
    PleaseWait,
    PleaseApprove,
    FirstBundle,
    UpdatedBundle,
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PleaseConfirm => "please-confirm",
            Self::PleaseWait => "please-wait",
            Self::PleaseApprove => "please-approve",
            Self::FirstBundle => "first-bundle",
            Self::UpdatedBundle => "updated-bundle",
        };
        f.write_str(label)
    }
}

pub fn subject(template: TemplateName) -> &'static str {
    match template {
        TemplateName::PleaseConfirm => "Please confirm your subscription",
        TemplateName::PleaseWait => "Your subscription is awaiting approval",
        TemplateName::PleaseApprove => "A subscriber is waiting for approval",
        TemplateName::FirstBundle => "Welcome to the list",
        TemplateName::UpdatedBundle => "Latest documents enclosed",
    }
}

/// Plain-text body with the action link for the given template.
pub fn body(template: TemplateName, base_url: &str, username: &str, token: &str) -> String {
    match template {
        TemplateName::PleaseConfirm => format!(
            "Hello {username},\n\n\
             please confirm your subscription by presenting this token:\n\n\
             {base_url}/confirm?email={username}&token={token}\n\n\
             If you did not subscribe, simply ignore this mail.\n"
        ),
        TemplateName::PleaseWait => format!(
            "Hello {username},\n\n\
             thank you for confirming. Your subscription now awaits the list\n\
             owner's approval; you will receive the first documents once it\n\
             has been granted.\n"
        ),
        TemplateName::PleaseApprove => format!(
            "{username} has confirmed their subscription.\n\n\
             Approve it by presenting this token:\n\n\
             {base_url}/approve?email={username}&token={token}\n"
        ),
        TemplateName::FirstBundle | TemplateName::UpdatedBundle => format!(
            "Hello {username},\n\n\
             the current documents are attached.\n\n\
             To unsubscribe, present this token:\n\n\
             {base_url}/unsubscribe?email={username}&token={token}\n"
        ),
    }
}
