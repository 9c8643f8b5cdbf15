use anyhow::{bail, Result};

use taskdesk_core::auth;
use taskdesk_core::models::Credentials;

use super::{print_json, prompt_password, resolve_email};
use crate::app::App;
use crate::views::render_profile;

pub async fn register(app: &mut App, email: Option<String>) -> Result<()> {
    let email = resolve_email(app, email)?;
    let password = prompt_password()?;
    let credentials = Credentials::new(email, password);

    let profile = auth::register(&app.api, &credentials).await?;
    app.remember_email(&profile.email);

    if app.json {
        return print_json(&profile);
    }
    println!("Registration successful. Please login with `taskdesk login`.");
    Ok(())
}

pub async fn login(app: &mut App, email: Option<String>) -> Result<()> {
    let email = resolve_email(app, email)?;
    let password = prompt_password()?;
    let credentials = Credentials::new(email, password);

    let profile = auth::sign_in(&app.api, &mut app.session, &credentials).await?;
    app.remember_email(&profile.email);

    if app.json {
        return print_json(&profile);
    }
    println!("Logged in as {}", profile.email);
    Ok(())
}

pub fn logout(app: &mut App) -> Result<()> {
    let was_signed_in = app.session.is_authenticated();
    app.session.logout();
    if was_signed_in {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    let Some(profile) = app.profile() else {
        bail!(crate::app::NOT_SIGNED_IN);
    };
    if app.json {
        return print_json(profile);
    }
    print!("{}", render_profile(profile));
    Ok(())
}
