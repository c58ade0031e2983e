use docchat_types::{initials, LoginData, OtpVerifyData, RegistrationData, ResendOtpData, User};

use crate::state::CliState;

pub async fn login(state: &CliState, email: &str, password: &str) -> anyhow::Result<User> {
    let data = LoginData {
        email: email.to_string(),
        password: password.to_string(),
    };
    state
        .context
        .client()
        .login(&data)
        .await?
        .ok_or_else(|| anyhow::anyhow!("login accepted but no user was returned"))
}

pub async fn logout(state: &CliState) -> anyhow::Result<()> {
    state.context.api().logout().await?;
    Ok(())
}

pub async fn whoami(state: &CliState) -> anyhow::Result<()> {
    match state.context.api().user().await? {
        Some(user) => print_user(&user),
        None => println!("Not signed in"),
    }
    Ok(())
}

pub async fn register(state: &CliState, name: &str, email: &str, password: &str) -> anyhow::Result<()> {
    let data = RegistrationData {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };
    state.context.client().register(&data).await?;
    println!("Check {} for a one-time password, then run `docchat verify`.", email);
    Ok(())
}

pub async fn verify(state: &CliState, email: &str, otp: &str) -> anyhow::Result<()> {
    let data = OtpVerifyData {
        email: email.to_string(),
        otp: otp.to_string(),
    };
    match state.context.client().verify_otp(&data).await? {
        Some(user) => print_user(&user),
        None => println!("Verified"),
    }
    Ok(())
}

pub async fn resend_otp(state: &CliState, email: &str) -> anyhow::Result<()> {
    let data = ResendOtpData {
        email: email.to_string(),
    };
    state.context.client().resend_otp(&data).await?;
    Ok(())
}

/// Look up users to share with, hiding existing collaborators of `folder_id`
pub async fn search(state: &CliState, query: &str, folder_id: Option<&str>) -> anyhow::Result<()> {
    let mut search = state.context.user_search();
    if let Some(folder_id) = folder_id {
        let collaborators = state.context.api().folder_collaborators(folder_id).await?;
        search = search.exclude(collaborators.into_iter().map(|c| c.id));
    }

    let results = search.query(query).await?.unwrap_or_default();
    state.print(&results, |user| {
        format!("{}  {}", user.email, user.name.as_deref().unwrap_or("-"))
    })
}

fn print_user(user: &User) {
    println!("[{}] {} <{}>", initials(&user.name), user.name, user.email);
}
