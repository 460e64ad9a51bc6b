use crate::commands::{describe, AppContext};
use crate::domain::models::{
    AuthorizeReport, LoginReport, Role, SessionReport, SignupRequest, View,
};
use crate::services::api::ApiError;
use crate::services::navigation::Navigation;
use crate::services::output::{print_one, print_out};
use crate::services::policy::{authorize_view, requirement, Decision, Requirement};

pub async fn login(ctx: &AppContext, username: &str, password: &str) -> anyhow::Result<()> {
    let client = ctx.anonymous_client()?;
    let grant = client.login(username, password).await.map_err(describe)?;
    let role: Role = grant
        .role
        .parse()
        .map_err(|e| ApiError::AuthFailure(format!("login rejected: {e}")))?;
    if !ctx.store.set_session(grant.access_token, role) {
        anyhow::bail!("login rejected: backend returned an empty token");
    }

    let report = LoginReport {
        username: username.to_string(),
        role,
        landing: View::landing_for(role),
    };
    print_one(ctx.json, report, |r| {
        format!(
            "logged in as {} ({}); landing: {}",
            r.username,
            r.role,
            r.landing.path()
        )
    })
}

pub async fn signup(
    ctx: &AppContext,
    username: &str,
    password: &str,
    role: Role,
    then_login: bool,
) -> anyhow::Result<()> {
    let client = ctx.anonymous_client()?;
    client
        .signup(&SignupRequest {
            username: username.to_string(),
            password: password.to_string(),
            role,
        })
        .await
        .map_err(describe)?;
    if then_login {
        return login(ctx, username, password).await;
    }
    print_one(ctx.json, serde_json::json!({"username": username, "role": role}), |_| {
        format!("registered {username} ({role}); log in to continue")
    })
}

pub fn logout(ctx: &AppContext) -> anyhow::Result<()> {
    ctx.store.clear();
    print_one(ctx.json, "logged_out", |_| "logged out".to_string())
}

pub fn whoami(ctx: &AppContext) -> anyhow::Result<()> {
    let session = ctx.store.current();
    let report = SessionReport {
        authenticated: session.is_authenticated(),
        role: session.role(),
    };
    print_one(ctx.json, report, |r| match (r.authenticated, r.role) {
        (false, _) => "anonymous".to_string(),
        (true, Some(role)) => format!("logged in ({role})"),
        (true, None) => "logged in (no role)".to_string(),
    })
}

pub fn authorize(ctx: &AppContext, view: View) -> anyhow::Result<()> {
    let decision = authorize_view(view, &ctx.store.current());
    let required_role = match requirement(view) {
        Requirement::Protected(role) => role,
        Requirement::Public => None,
    };
    let report = AuthorizeReport {
        view,
        required_role,
        decision: match decision {
            Decision::Allow => "allow".to_string(),
            Decision::RedirectTo(_) => "redirect".to_string(),
        },
        redirect: match decision {
            Decision::Allow => None,
            Decision::RedirectTo(route) => Some(route.as_str().to_string()),
        },
    };
    print_one(ctx.json, report, |r| match &r.redirect {
        None => format!("{}: allow", r.view.path()),
        Some(to) => format!("{}: redirect to {}", r.view.path(), to),
    })
}

pub fn nav(ctx: &AppContext) -> anyhow::Result<()> {
    let navigation = Navigation::attach(&ctx.store);
    print_out(ctx.json, &navigation.items(), |i| {
        format!("{}\t{}", i.name, i.path)
    })
}
