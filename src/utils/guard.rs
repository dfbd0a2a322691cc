// src/utils/guard.rs

use serde::Serialize;

use crate::models::user::Principal;

/// Outcome of a route-guard check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "access", content = "redirect_to")]
pub enum Access {
    Allow,
    Redirect(&'static str),
}

/// Route families of the user-facing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteClass {
    /// Admin dashboard, quiz/lesson/result management.
    Admin,
    /// User dashboard, lesson viewer, history.
    UserOnly,
    /// Quiz-taking pages: any signed-in principal.
    Authenticated,
    Public,
}

fn classify(path: &str) -> RouteClass {
    if path == "/admin" || path.starts_with("/admin/") {
        RouteClass::Admin
    } else if path == "/user" || path.starts_with("/user/") {
        RouteClass::UserOnly
    } else if path == "/quiz" || path.starts_with("/quiz/") {
        RouteClass::Authenticated
    } else {
        RouteClass::Public
    }
}

/// The authorization decision function, evaluated once per request.
///
/// An absent principal means "not signed in"; an indeterminate auth state is
/// the caller's loading state and never reaches this function.
pub fn decide(principal: Option<&Principal>, admin_email: &str, path: &str) -> Access {
    let class = classify(path);

    let Some(principal) = principal else {
        return match class {
            RouteClass::Public => Access::Allow,
            _ => Access::Redirect("/"),
        };
    };

    let is_admin = principal.is_admin(admin_email);

    match class {
        RouteClass::Admin if !is_admin => Access::Redirect("/user/dashboard"),
        RouteClass::UserOnly if is_admin => Access::Redirect("/admin/dashboard"),
        _ => Access::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: &str = "admin@example.com";

    fn principal(email: &str) -> Principal {
        Principal {
            id: "uid-1".to_string(),
            name: "Someone".to_string(),
            email: email.to_string(),
            avatar_url: None,
        }
    }

    #[test]
    fn signed_out_is_never_admin_and_lands_on_public() {
        assert_eq!(decide(None, ADMIN, "/admin/quizzes"), Access::Redirect("/"));
        assert_eq!(decide(None, ADMIN, "/user/dashboard"), Access::Redirect("/"));
        assert_eq!(decide(None, ADMIN, "/quiz/abc"), Access::Redirect("/"));
        assert_eq!(decide(None, ADMIN, "/"), Access::Allow);
    }

    #[test]
    fn non_admin_is_bounced_off_admin_routes() {
        let user = principal("user@example.com");
        assert_eq!(
            decide(Some(&user), ADMIN, "/admin/dashboard"),
            Access::Redirect("/user/dashboard")
        );
        assert_eq!(decide(Some(&user), ADMIN, "/user/history"), Access::Allow);
        assert_eq!(decide(Some(&user), ADMIN, "/quiz/abc"), Access::Allow);
    }

    #[test]
    fn admin_is_bounced_off_user_only_routes() {
        let admin = principal(ADMIN);
        assert_eq!(
            decide(Some(&admin), ADMIN, "/user/dashboard"),
            Access::Redirect("/admin/dashboard")
        );
        assert_eq!(decide(Some(&admin), ADMIN, "/admin/lessons"), Access::Allow);
        assert_eq!(decide(Some(&admin), ADMIN, "/quiz/abc"), Access::Allow);
    }

    #[test]
    fn public_landing_is_open_to_everyone() {
        let admin = principal(ADMIN);
        let user = principal("user@example.com");
        assert_eq!(decide(Some(&admin), ADMIN, "/"), Access::Allow);
        assert_eq!(decide(Some(&user), ADMIN, "/"), Access::Allow);
    }

    #[test]
    fn prefix_matching_does_not_leak_into_sibling_paths() {
        // "/username" is not under "/user".
        assert_eq!(decide(None, ADMIN, "/username"), Access::Allow);
        assert_eq!(decide(None, ADMIN, "/administrator"), Access::Allow);
    }
}
