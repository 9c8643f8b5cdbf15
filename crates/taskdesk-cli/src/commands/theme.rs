use anyhow::Result;
use clap::Subcommand;

use taskdesk_core::Theme;

use crate::app::App;

#[derive(Subcommand)]
pub enum ThemeCommand {
    /// Print the current theme
    Show,
    /// Switch between light and dark
    Toggle,
    /// Set the theme explicitly
    Set { theme: Theme },
}

pub fn run(app: &mut App, command: Option<ThemeCommand>) -> Result<()> {
    let storage = app.session.storage_mut();
    let current = Theme::load(&*storage)?;

    let next = match command.unwrap_or(ThemeCommand::Show) {
        ThemeCommand::Show => {
            println!("{}", current);
            return Ok(());
        }
        ThemeCommand::Toggle => current.toggled(),
        ThemeCommand::Set { theme } => theme,
    };

    next.save(storage)?;
    println!("Theme set to {}", next);
    Ok(())
}
