/// Notification message templates
///
/// Two variants, matching the two ways the assignment workflow reaches a
/// user:
///
/// - `provisioning_email`: a new (or backfilled) account - carries the
///   login email, the temporary credential, and the sign-in link
/// - `assignment_email`: an existing account - assignment announcement
///   only, no credential
///
/// Rendering is plain `format!` into paired text/HTML bodies; anything
/// fancier belongs to a front-of-house template system, not this service.

use super::OutboundEmail;

/// Renders the provisioning notification for a newly credentialed account
///
/// The temporary credential appears only in the rendered bodies; callers
/// must not log the returned message.
pub fn provisioning_email(
    to: &str,
    course_title: &str,
    temp_password: &str,
    base_url: &str,
) -> OutboundEmail {
    let signin_url = format!("{}/signin", base_url.trim_end_matches('/'));
    let subject = format!("Your training account - {}", course_title);

    let text = format!(
        "Hello,\n\n\
         You have been enrolled in the course \"{course_title}\" and a training \
         account has been created for you.\n\n\
         Sign in at {signin_url} with:\n\
         Email: {to}\n\
         Temporary password: {temp_password}\n\n\
         You will be asked to choose a new password on first sign-in.\n"
    );

    let html = format!(
        "<p>Hello,</p>\
         <p>You have been enrolled in the course <strong>{course_title}</strong> \
         and a training account has been created for you.</p>\
         <p>Sign in at <a href=\"{signin_url}\">{signin_url}</a> with:</p>\
         <p>Email: {to}<br>Temporary password: <code>{temp_password}</code></p>\
         <p>You will be asked to choose a new password on first sign-in.</p>"
    );

    OutboundEmail {
        to: to.to_string(),
        subject,
        html,
        text,
    }
}

/// Renders the assignment announcement for an existing account
pub fn assignment_email(to: &str, course_title: &str, base_url: &str) -> OutboundEmail {
    let signin_url = format!("{}/signin", base_url.trim_end_matches('/'));
    let subject = format!("New training assigned - {}", course_title);

    let text = format!(
        "Hello,\n\n\
         The course \"{course_title}\" has been assigned to you.\n\n\
         Sign in at {signin_url} to start.\n"
    );

    let html = format!(
        "<p>Hello,</p>\
         <p>The course <strong>{course_title}</strong> has been assigned to you.</p>\
         <p><a href=\"{signin_url}\">Sign in</a> to start.</p>"
    );

    OutboundEmail {
        to: to.to_string(),
        subject,
        html,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisioning_email_carries_credential_and_link() {
        let email = provisioning_email(
            "jane@example.com",
            "Data Privacy Basics",
            "Tmp!Pass123x",
            "https://training.example.com/",
        );

        assert_eq!(email.to, "jane@example.com");
        assert!(email.subject.contains("Data Privacy Basics"));
        assert!(email.text.contains("Tmp!Pass123x"));
        assert!(email.html.contains("Tmp!Pass123x"));
        assert!(email.text.contains("https://training.example.com/signin"));
        assert!(email.html.contains("https://training.example.com/signin"));
        assert!(email.text.contains("jane@example.com"));
    }

    #[test]
    fn test_assignment_email_has_no_credential_language() {
        let email = assignment_email(
            "joe@example.com",
            "Security Awareness",
            "https://training.example.com",
        );

        assert!(email.subject.contains("Security Awareness"));
        assert!(email.text.contains("https://training.example.com/signin"));
        assert!(!email.text.to_lowercase().contains("password"));
        assert!(!email.html.to_lowercase().contains("password"));
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let with_slash = assignment_email("a@b.co", "C", "https://x.io/");
        let without = assignment_email("a@b.co", "C", "https://x.io");

        assert!(with_slash.text.contains("https://x.io/signin"));
        assert!(without.text.contains("https://x.io/signin"));
    }
}
